//! Alias registry contract.
//!
//! The registry is the external catalog of deployment environments
//! (site aliases). All queries are read-only; the concrete
//! implementation lives in `drush.rs`.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// Resolved metadata for one environment instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvRecord {
    pub id: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl EnvRecord {
    /// Remote endpoint prefix for a file transfer (`user@host:` or `host:`).
    /// Returns None when the record has no host (a purely local record).
    pub fn remote_prefix(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => Some(format!("{}@{}:", user, host)),
            _ => Some(format!("{}:", host)),
        }
    }

    /// The deployable code directory is the parent of the registered web
    /// root (the root points at the docroot inside the checkout).
    pub fn code_dir(&self) -> Result<String> {
        let root = self
            .root
            .as_deref()
            .ok_or_else(|| Error::root_path_unavailable(self.id.as_str(), "alias has no root"))?;
        let parent = Path::new(root)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                Error::root_path_unavailable(self.id.as_str(), "root has no parent directory")
            })?;
        Ok(parent.display().to_string())
    }
}

/// Read-only environment registry.
pub trait Registry {
    /// Identity the executing host is registered under.
    fn local_identity(&self) -> Result<String>;

    /// Full record for one identity.
    fn describe(&self, id: &str) -> Result<EnvRecord>;

    /// All registered identities starting with the given tier token.
    fn list_instances(&self, tier_token: &str) -> Result<Vec<String>>;

    /// Confirm the environment is reachable.
    fn probe(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(host: Option<&str>, user: Option<&str>) -> EnvRecord {
        EnvRecord {
            id: "prod1".to_string(),
            uri: "https://www.example.com".to_string(),
            host: host.map(String::from),
            user: user.map(String::from),
            root: None,
        }
    }

    #[test]
    fn remote_prefix_with_user() {
        let rec = record(Some("prod1.example.com"), Some("deploy"));
        assert_eq!(
            rec.remote_prefix().as_deref(),
            Some("deploy@prod1.example.com:")
        );
    }

    #[test]
    fn remote_prefix_without_user() {
        let rec = record(Some("prod1.example.com"), None);
        assert_eq!(rec.remote_prefix().as_deref(), Some("prod1.example.com:"));
    }

    #[test]
    fn remote_prefix_local_record() {
        assert!(record(None, Some("deploy")).remote_prefix().is_none());
    }

    #[test]
    fn code_dir_is_parent_of_root() {
        let mut rec = record(None, None);
        rec.root = Some("/var/www/prod1/web".to_string());
        assert_eq!(rec.code_dir().unwrap(), "/var/www/prod1");
    }

    #[test]
    fn code_dir_requires_a_root() {
        let err = record(None, None).code_dir().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::RootPathUnavailable);
    }

    #[test]
    fn code_dir_rejects_bare_root() {
        let mut rec = record(None, None);
        rec.root = Some("/".to_string());
        assert!(rec.code_dir().is_err());
    }
}
