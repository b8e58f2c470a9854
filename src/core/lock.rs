//! Per-environment run lock.
//!
//! A lease file under the lock directory guards against two promotions
//! touching the same environment at once. Leases carry an expiry so a
//! crashed run never wedges the environment forever.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lease {
    pid: u32,
    token: String,
    acquired_at: i64,
    expires_at: i64,
}

/// Held lock for one environment. Release explicitly; dropping without
/// releasing leaves the lease to expire on its own.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    token: String,
}

impl RunLock {
    /// Acquire the lock for `identity`, reclaiming an expired lease.
    pub fn acquire(lock_dir: &Path, identity: &str, ttl_secs: u64) -> Result<Self> {
        fs::create_dir_all(lock_dir).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", lock_dir.display())))
        })?;

        let path = lock_dir.join(format!("{}.lock", identity));
        let now = Utc::now().timestamp();

        if let Some(existing) = read_lease(&path)? {
            if existing.expires_at > now {
                return Err(Error::lock_held(identity, path.display().to_string()));
            }
        }

        let lease = Lease {
            pid: std::process::id(),
            token: Uuid::new_v4().to_string(),
            acquired_at: now,
            expires_at: now + ttl_secs as i64,
        };
        let body = serde_json::to_string_pretty(&lease)
            .map_err(|e| Error::internal_json(e.to_string(), Some("serialize lease".to_string())))?;
        fs::write(&path, body).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
        })?;

        Ok(Self {
            path,
            token: lease.token,
        })
    }

    /// Remove the lease, but only if it is still ours.
    pub fn release(self) -> Result<()> {
        match read_lease(&self.path)? {
            Some(lease) if lease.token == self.token => {
                fs::remove_file(&self.path).map_err(|e| {
                    Error::internal_io(e.to_string(), Some(format!("remove {}", self.path.display())))
                })
            }
            _ => Ok(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_lease(path: &Path) -> Result<Option<Lease>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;
    // A torn or hand-edited lease counts as expired.
    Ok(serde_json::from_str(&raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn acquire_then_release_removes_lease() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path(), "test1", 60).unwrap();
        let path = lock.path().to_path_buf();
        assert!(path.exists());

        lock.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_is_refused_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let _lock = RunLock::acquire(dir.path(), "stage1", 60).unwrap();

        let err = RunLock::acquire(dir.path(), "stage1", 60).unwrap_err();
        assert_eq!(err.code, ErrorCode::LockHeld);
        assert_eq!(err.retryable, Some(true));
    }

    #[test]
    fn distinct_identities_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let _a = RunLock::acquire(dir.path(), "stage1", 60).unwrap();
        assert!(RunLock::acquire(dir.path(), "stage2", 60).is_ok());
    }

    #[test]
    fn expired_lease_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test1.lock");
        let stale = Lease {
            pid: 1,
            token: "stale".to_string(),
            acquired_at: 0,
            expires_at: 1,
        };
        fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        assert!(RunLock::acquire(dir.path(), "test1", 60).is_ok());
    }

    #[test]
    fn corrupt_lease_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test1.lock"), "{torn").unwrap();
        assert!(RunLock::acquire(dir.path(), "test1", 60).is_ok());
    }

    #[test]
    fn release_leaves_foreign_lease_alone() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path(), "test1", 60).unwrap();
        let path = lock.path().to_path_buf();

        // Simulate another run reclaiming after expiry.
        let other = Lease {
            pid: 2,
            token: "other".to_string(),
            acquired_at: 10,
            expires_at: i64::MAX,
        };
        fs::write(&path, serde_json::to_string(&other).unwrap()).unwrap();

        lock.release().unwrap();
        assert!(path.exists());
    }
}
