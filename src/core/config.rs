//! Global configuration (~/.config/stagehand/stagehand.json).
//!
//! Every field has a default so a missing config file yields a fully
//! usable setup. A file that exists but fails to parse is an error; a
//! half-read config must never drive a destructive promotion.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Account promotions must run as.
    #[serde(default = "default_operator_user")]
    pub operator_user: String,

    /// Canonical production instance content refreshes pull from.
    #[serde(default = "default_production_instance")]
    pub production_instance: String,

    /// Shared uploaded-files tree, identical layout on every host.
    #[serde(default = "default_shared_files_path")]
    pub shared_files_path: String,

    #[serde(default = "default_drush_bin")]
    pub drush_bin: String,

    #[serde(default = "default_rsync_bin")]
    pub rsync_bin: String,

    /// Patterns left untouched when mirroring uploaded files.
    #[serde(default = "default_content_excludes")]
    pub content_excludes: Vec<String>,

    /// Patterns left untouched when mirroring the code tree.
    #[serde(default = "default_code_excludes")]
    pub code_excludes: Vec<String>,

    /// Overrides the default lock directory (~/.config/stagehand/locks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<String>,

    /// Age after which a stale lock may be reclaimed.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

fn default_operator_user() -> String {
    "deploy".to_string()
}

fn default_production_instance() -> String {
    "prod1".to_string()
}

fn default_shared_files_path() -> String {
    "/var/www/shared/files".to_string()
}

fn default_drush_bin() -> String {
    "drush".to_string()
}

fn default_rsync_bin() -> String {
    "rsync".to_string()
}

fn default_content_excludes() -> Vec<String> {
    vec![
        ".htaccess".to_string(),
        "css".to_string(),
        "js".to_string(),
        "styles".to_string(),
    ]
}

fn default_code_excludes() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".gitignore".to_string(),
        "robots.txt".to_string(),
    ]
}

fn default_lock_ttl_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator_user: default_operator_user(),
            production_instance: default_production_instance(),
            shared_files_path: default_shared_files_path(),
            drush_bin: default_drush_bin(),
            rsync_bin: default_rsync_bin(),
            content_excludes: default_content_excludes(),
            code_excludes: default_code_excludes(),
            lock_dir: None,
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

impl Config {
    /// Load from the global config file. A missing file is not an
    /// error; defaults apply.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_json()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.operator_user.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "operatorUser",
                "must not be empty",
            ));
        }
        if self.production_instance.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "productionInstance",
                "must not be empty",
            ));
        }
        if self.lock_ttl_secs == 0 {
            return Err(Error::config_invalid_value(
                "lockTtlSecs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Location of the global config file.
    pub fn path() -> Result<PathBuf> {
        paths::config_json()
    }

    /// Directory run locks live in.
    pub fn lock_dir(&self) -> Result<PathBuf> {
        match &self.lock_dir {
            Some(dir) => Ok(PathBuf::from(shellexpand::tilde(dir).to_string())),
            None => paths::locks(),
        }
    }
}
