//! Code promotion: push the local code tree one tier up, one
//! destination at a time, each behind its own maintenance window.
//!
//! A destination is taken offline, mirrored, migrated, and brought back
//! before the next destination is touched, so at most one instance of a
//! tier is down at any moment. Any failure aborts the whole run;
//! remaining destinations keep their current code.

use std::path::Path;

use crate::config::Config;
use crate::drush::SiteOps;
use crate::error::{Error, Result};
use crate::identity::EnvId;
use crate::lock::RunLock;
use crate::output::{CodeOutput, StepReport};
use crate::registry::{EnvRecord, Registry};
use crate::rsync::{FileMirror, MirrorSpec};
use crate::topology;

pub fn run(
    config: &Config,
    registry: &dyn Registry,
    site: &dyn SiteOps,
    mirror: &dyn FileMirror,
    user: &str,
    cwd: &Path,
) -> Result<CodeOutput> {
    crate::preflight::check_operator(&config.operator_user, user)?;

    let identity = registry.local_identity()?;
    let local = EnvId::parse(&identity)?;
    let local_record = registry.describe(&identity)?;
    if local_record.uri.trim().is_empty() {
        return Err(Error::local_alias_unavailable(
            identity.as_str(),
            "alias has no uri",
        ));
    }

    let local_code = local_record.code_dir()?;
    crate::preflight::ensure_outside_tree(cwd, Path::new(&local_code))?;

    let tier = topology::resolve_destination_tier(&local)?;
    let destinations = topology::enumerate_destinations(registry, tier)?;

    // Resolve every destination's code directory before the first
    // maintenance window opens; a missing root must not strand a tier
    // half promoted.
    let remote_codes = destinations
        .iter()
        .map(EnvRecord::code_dir)
        .collect::<Result<Vec<_>>>()?;

    let mut steps = Vec::new();
    for (dest, remote_code) in destinations.iter().zip(&remote_codes) {
        promote_one(config, site, mirror, &local_code, remote_code, dest, &mut steps)?;
    }

    Ok(CodeOutput {
        command: "code.promote".to_string(),
        source: identity,
        destination_tier: tier.token().to_string(),
        destinations: destinations.iter().map(|d| d.id.clone()).collect(),
        code_path: local_code,
        steps,
    })
}

fn promote_one(
    config: &Config,
    site: &dyn SiteOps,
    mirror: &dyn FileMirror,
    local_code: &str,
    remote_code: &str,
    dest: &EnvRecord,
    steps: &mut Vec<StepReport>,
) -> Result<()> {
    let lock = RunLock::acquire(&config.lock_dir()?, &dest.id, config.lock_ttl_secs)?;
    let result = maintenance_window(config, site, mirror, local_code, remote_code, dest, steps);
    let released = lock.release();
    result?;
    released
}

fn maintenance_window(
    config: &Config,
    site: &dyn SiteOps,
    mirror: &dyn FileMirror,
    local_code: &str,
    remote_code: &str,
    dest: &EnvRecord,
    steps: &mut Vec<StepReport>,
) -> Result<()> {
    let id = dest.id.as_str();
    log_status!("code", "Taking {} into maintenance", id);
    site.set_maintenance(id, true)?;
    steps.push(StepReport::new("maintenance-on", id));

    log_status!("code", "Mirroring code tree to {}", id);
    mirror.mirror("code-mirror", id, &code_mirror_spec(config, local_code, remote_code, dest)?)?;
    steps.push(StepReport::new("code-mirror", id));

    site.clear_cache(id)?;
    steps.push(StepReport::new("cache-clear", id));

    log_status!("code", "Applying database migrations on {}", id);
    site.apply_migrations(id)?;
    steps.push(StepReport::new("migrations", id));

    site.clear_cache(id)?;
    steps.push(StepReport::new("cache-clear", id));

    log_status!("code", "Bringing {} back online", id);
    site.set_maintenance(id, false)?;
    steps.push(StepReport::new("maintenance-off", id));

    site.clear_cache(id)?;
    steps.push(StepReport::new("cache-clear", id));

    Ok(())
}

fn code_mirror_spec(
    config: &Config,
    local_code: &str,
    remote_code: &str,
    dest: &EnvRecord,
) -> Result<MirrorSpec> {
    let prefix = dest
        .remote_prefix()
        .ok_or_else(|| Error::registry_lookup_failed(dest.id.as_str(), "alias has no host"))?;
    Ok(MirrorSpec {
        source: format!("{}/", local_code.trim_end_matches('/')),
        dest: format!("{}{}/", prefix, remote_code.trim_end_matches('/')),
        checksum: true,
        excludes: config.code_excludes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    type OpLog = Rc<RefCell<Vec<String>>>;

    struct FakeRegistry {
        local: String,
        instances: Vec<String>,
    }

    impl Registry for FakeRegistry {
        fn local_identity(&self) -> Result<String> {
            Ok(self.local.clone())
        }

        fn describe(&self, id: &str) -> Result<EnvRecord> {
            Ok(EnvRecord {
                id: id.to_string(),
                uri: format!("https://{}.example.com", id),
                host: Some(format!("{}.example.com", id)),
                user: Some("deploy".to_string()),
                root: Some(format!("/var/www/{}/web", id)),
            })
        }

        fn list_instances(&self, tier_token: &str) -> Result<Vec<String>> {
            Ok(self
                .instances
                .iter()
                .filter(|i| i.starts_with(tier_token))
                .cloned()
                .collect())
        }

        fn probe(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FakeSite {
        ops: OpLog,
        fail_at: Option<&'static str>,
    }

    impl FakeSite {
        fn record(&self, op: String) -> Result<()> {
            let fail = self.fail_at == Some(op.as_str());
            self.ops.borrow_mut().push(op.clone());
            if fail {
                let output = crate::exec::CommandOutput {
                    stdout: String::new(),
                    stderr: "boom".to_string(),
                    success: false,
                    exit_code: 1,
                };
                return Err(Error::step_failed("site-op", None, op, &output));
            }
            Ok(())
        }
    }

    impl SiteOps for FakeSite {
        fn drop_tables(&self, id: &str) -> Result<()> {
            self.record(format!("drop {}", id))
        }

        fn sync_database(&self, source: &str, dest: &str) -> Result<()> {
            self.record(format!("sync {} {}", source, dest))
        }

        fn apply_migrations(&self, id: &str) -> Result<()> {
            self.record(format!("updatedb {}", id))
        }

        fn clear_cache(&self, id: &str) -> Result<()> {
            self.record(format!("cache {}", id))
        }

        fn set_maintenance(&self, id: &str, enabled: bool) -> Result<()> {
            self.record(format!("maintenance {} {}", id, enabled))
        }
    }

    struct FakeMirror {
        ops: OpLog,
    }

    impl FileMirror for FakeMirror {
        fn mirror(&self, step: &str, target: &str, spec: &MirrorSpec) -> Result<()> {
            self.ops
                .borrow_mut()
                .push(format!("{} {} {}", step, target, spec.dest));
            Ok(())
        }
    }

    struct Harness {
        ops: OpLog,
        config: Config,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.lock_dir = Some(dir.path().display().to_string());
        Harness {
            ops: Rc::new(RefCell::new(Vec::new())),
            config,
            _dir: dir,
        }
    }

    fn run_with(
        h: &Harness,
        local: &str,
        instances: Vec<&str>,
        fail_at: Option<&'static str>,
        user: &str,
    ) -> Result<CodeOutput> {
        let registry = FakeRegistry {
            local: local.to_string(),
            instances: instances.iter().map(|s| s.to_string()).collect(),
        };
        let site = FakeSite {
            ops: h.ops.clone(),
            fail_at,
        };
        let mirror = FakeMirror { ops: h.ops.clone() };
        run(
            &h.config,
            &registry,
            &site,
            &mirror,
            user,
            &PathBuf::from("/home/deploy"),
        )
    }

    fn window_ops(id: &str) -> Vec<String> {
        vec![
            format!("maintenance {} true", id),
            format!(
                "code-mirror {} deploy@{}.example.com:/var/www/{}/",
                id, id, id
            ),
            format!("cache {}", id),
            format!("updatedb {}", id),
            format!("cache {}", id),
            format!("maintenance {} false", id),
            format!("cache {}", id),
        ]
    }

    #[test]
    fn each_destination_completes_before_the_next_starts() {
        let h = harness();
        let out = run_with(&h, "test1", vec!["stage1", "stage2"], None, "deploy").unwrap();

        assert_eq!(out.destination_tier, "stage");
        assert_eq!(out.destinations, vec!["stage2", "stage1"]);
        assert_eq!(out.code_path, "/var/www/test1");

        let mut expected = window_ops("stage2");
        expected.extend(window_ops("stage1"));
        assert_eq!(*h.ops.borrow(), expected);
    }

    #[test]
    fn stage_promotes_to_prod() {
        let h = harness();
        let out = run_with(&h, "stage1", vec!["prod1"], None, "deploy").unwrap();
        assert_eq!(out.destination_tier, "prod");
        assert_eq!(out.destinations, vec!["prod1"]);
    }

    #[test]
    fn prod_has_nowhere_to_promote() {
        let h = harness();
        let err = run_with(&h, "prod1", vec!["prod1"], None, "deploy").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedTier);
        assert!(h.ops.borrow().is_empty());
    }

    #[test]
    fn empty_destination_tier_is_an_error() {
        let h = harness();
        let err = run_with(&h, "test1", vec!["prod1"], None, "deploy").unwrap_err();
        assert_eq!(err.code, ErrorCode::NoDestinationFound);
        assert!(h.ops.borrow().is_empty());
    }

    #[test]
    fn wrong_user_triggers_no_remote_ops() {
        let h = harness();
        let err = run_with(&h, "test1", vec!["stage1"], None, "alice").unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(h.ops.borrow().is_empty());
    }

    #[test]
    fn failure_mid_window_leaves_later_destinations_untouched() {
        let h = harness();
        let err = run_with(
            &h,
            "test1",
            vec!["stage1", "stage2"],
            Some("updatedb stage2"),
            "deploy",
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::StepFailed);
        let ops = h.ops.borrow();
        assert_eq!(ops.last().map(String::as_str), Some("updatedb stage2"));
        assert!(!ops.iter().any(|op| op.contains("stage1")));
    }

    #[test]
    fn failed_window_still_releases_the_lock() {
        let h = harness();
        run_with(
            &h,
            "test1",
            vec!["stage1"],
            Some("maintenance stage1 true"),
            "deploy",
        )
        .unwrap_err();

        assert!(RunLock::acquire(
            &h.config.lock_dir().unwrap(),
            "stage1",
            h.config.lock_ttl_secs
        )
        .is_ok());
    }
}
