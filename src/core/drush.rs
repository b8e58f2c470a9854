//! Wrapper around the alias-aware site CLI (drush).
//!
//! Drush plays two roles here: it is the environment registry
//! (`site:alias` queries) and the remote site-management surface
//! (database, cache, and maintenance operations addressed by alias).
//! Failures surface as-is; nothing is reinterpreted.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::exec::{display_command, CommandOutput, CommandRunner};
use crate::registry::{EnvRecord, Registry};

/// Remote site-management operations addressed by environment identity.
pub trait SiteOps {
    fn drop_tables(&self, id: &str) -> Result<()>;
    fn sync_database(&self, source: &str, dest: &str) -> Result<()>;
    fn apply_migrations(&self, id: &str) -> Result<()>;
    fn clear_cache(&self, id: &str) -> Result<()>;
    fn set_maintenance(&self, id: &str, enabled: bool) -> Result<()>;
}

pub struct Drush<'a> {
    bin: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> Drush<'a> {
    pub fn new(bin: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            bin: bin.into(),
            runner,
        }
    }

    fn run(&self, args: &[String]) -> CommandOutput {
        self.runner.run(&self.bin, args)
    }

    fn run_json(&self, args: &[String], identity: &str) -> Result<Value> {
        let output = self.run(args);
        if !output.success {
            return Err(Error::registry_lookup_failed(
                identity,
                output.error_detail().to_string(),
            ));
        }
        serde_json::from_str(&output.stdout).map_err(|e| {
            Error::registry_lookup_failed(identity, format!("unparsable alias output: {}", e))
        })
    }

    /// Run a mutating site operation; non-zero exit is a hard step failure.
    fn site_op(&self, step: &str, target: &str, args: Vec<String>) -> Result<()> {
        let output = self.run(&args);
        if output.success {
            return Ok(());
        }
        Err(Error::step_failed(
            step,
            Some(target.to_string()),
            display_command(&self.bin, &args),
            &output,
        ))
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Alias keys come back as `@stage1` or `stage1.site`; reduce to the
/// bare identity.
fn normalize_alias_key(key: &str) -> String {
    let key = key.strip_prefix('@').unwrap_or(key);
    key.split('.').next().unwrap_or(key).to_string()
}

/// Pull the single alias object out of a `site:alias @name` JSON payload.
fn single_alias_value(doc: &Value) -> Option<&Value> {
    let map = doc.as_object()?;
    map.values().next()
}

fn record_from_alias(id: &str, alias: &Value) -> EnvRecord {
    let field = |name: &str| {
        alias
            .get(name)
            .and_then(Value::as_str)
            .map(|s| s.to_string())
    };
    EnvRecord {
        id: id.to_string(),
        uri: field("uri").unwrap_or_default(),
        host: field("host"),
        user: field("user"),
        root: field("root"),
    }
}

impl Registry for Drush<'_> {
    fn local_identity(&self) -> Result<String> {
        let doc = self
            .run_json(&args(&["site:alias", "@self", "--format=json"]), "@self")
            .map_err(|e| Error::local_alias_unavailable("@self", e.message))?;

        let key = doc
            .as_object()
            .and_then(|map| map.keys().next())
            .ok_or_else(|| {
                Error::local_alias_unavailable("@self", "no alias registered for this host")
            })?;

        Ok(normalize_alias_key(key))
    }

    fn describe(&self, id: &str) -> Result<EnvRecord> {
        let doc = self.run_json(
            &args(&["site:alias", &format!("@{}", id), "--format=json"]),
            id,
        )?;
        let alias = single_alias_value(&doc)
            .ok_or_else(|| Error::registry_lookup_failed(id, "alias not found"))?;
        Ok(record_from_alias(id, alias))
    }

    fn list_instances(&self, tier_token: &str) -> Result<Vec<String>> {
        let doc = self.run_json(&args(&["site:alias", "--format=json"]), tier_token)?;
        let map = doc
            .as_object()
            .ok_or_else(|| Error::registry_lookup_failed(tier_token, "unparsable alias list"))?;

        Ok(map
            .keys()
            .map(|k| normalize_alias_key(k))
            .filter(|id| id.starts_with(tier_token))
            .collect())
    }

    fn probe(&self, id: &str) -> Result<()> {
        let probe_args = args(&[&format!("@{}", id), "core:status", "--format=json"]);
        let output = self.run(&probe_args);
        if output.success {
            return Ok(());
        }
        Err(Error::source_unreachable(
            id,
            output.error_detail().to_string(),
        ))
    }
}

impl SiteOps for Drush<'_> {
    fn drop_tables(&self, id: &str) -> Result<()> {
        self.site_op(
            "schema-drop",
            id,
            args(&[&format!("@{}", id), "sql:drop", "-y"]),
        )
    }

    fn sync_database(&self, source: &str, dest: &str) -> Result<()> {
        self.site_op(
            "database-sync",
            dest,
            args(&[
                "sql:sync",
                &format!("@{}", source),
                &format!("@{}", dest),
                "-y",
            ]),
        )
    }

    fn apply_migrations(&self, id: &str) -> Result<()> {
        self.site_op(
            "migrations",
            id,
            args(&[&format!("@{}", id), "updatedb", "-y"]),
        )
    }

    fn clear_cache(&self, id: &str) -> Result<()> {
        self.site_op(
            "cache-clear",
            id,
            args(&[&format!("@{}", id), "cache:rebuild"]),
        )
    }

    fn set_maintenance(&self, id: &str, enabled: bool) -> Result<()> {
        let flag = if enabled { "1" } else { "0" };
        self.site_op(
            "maintenance-mode",
            id,
            args(&[
                &format!("@{}", id),
                "state:set",
                "system.maintenance_mode",
                flag,
                "--input-format=integer",
            ]),
        )
    }
}
