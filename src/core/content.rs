//! Content refresh: pull production's uploaded files and database down
//! into the local test or stage environment.
//!
//! The local database is dropped outright before the sync so no stale
//! tables survive a schema change upstream. Order is load-bearing:
//! nothing destructive runs until the production source has answered a
//! probe.

use std::path::Path;

use crate::config::Config;
use crate::drush::SiteOps;
use crate::error::{Error, Result};
use crate::identity::EnvId;
use crate::lock::RunLock;
use crate::output::{ContentOutput, StepReport};
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
) -> Result<ContentOutput> {
    crate::preflight::check_operator(&config.operator_user, user)?;

    let identity = registry.local_identity()?;
    let local = EnvId::parse(&identity)?;
    let local_record = registry.describe(&identity)?;

    // Guard against the whole checkout, not just the docroot inside it.
    if local_record.root.is_some() {
        let code_tree = local_record.code_dir()?;
        crate::preflight::ensure_outside_tree(cwd, Path::new(&code_tree))?;
    }

    let source = topology::resolve_content_source(registry, &local, &config.production_instance)?;

    let lock = RunLock::acquire(&config.lock_dir()?, &identity, config.lock_ttl_secs)?;
    let result = refresh(config, registry, site, mirror, &local_record, source);
    let released = lock.release();
    let output = result?;
    released?;
    Ok(output)
}

fn refresh(
    config: &Config,
    registry: &dyn Registry,
    site: &dyn SiteOps,
    mirror: &dyn FileMirror,
    local_record: &EnvRecord,
    source: EnvRecord,
) -> Result<ContentOutput> {
    registry.probe(&source.id)?;

    let mut steps = Vec::new();
    let local_id = local_record.id.clone();

    log_status!(
        "content",
        "Mirroring uploaded files from {} to {}",
        source.id,
        local_id
    );
    mirror.mirror("files-mirror", &local_id, &files_mirror_spec(config, &source)?)?;
    steps.push(StepReport::new("files-mirror", &local_id));

    log_status!("content", "Dropping {} database tables", local_id);
    site.drop_tables(&local_id)?;
    steps.push(StepReport::new("schema-drop", &local_id));

    log_status!("content", "Syncing database {} -> {}", source.id, local_id);
    site.sync_database(&source.id, &local_id)?;
    steps.push(StepReport::new("database-sync", &local_id));

    log_status!("content", "Rebuilding {} caches", local_id);
    site.clear_cache(&local_id)?;
    steps.push(StepReport::new("cache-clear", &local_id));

    Ok(ContentOutput {
        command: "content.refresh".to_string(),
        source: source.id,
        destination: local_id,
        steps,
    })
}

/// Uploaded files live at the same path on every host, so the remote
/// and local endpoints differ only in prefix.
fn files_mirror_spec(config: &Config, source: &EnvRecord) -> Result<MirrorSpec> {
    let prefix = source
        .remote_prefix()
        .ok_or_else(|| Error::source_unreachable(source.id.as_str(), "alias has no host"))?;
    let files = format!("{}/", config.shared_files_path.trim_end_matches('/'));
    Ok(MirrorSpec {
        source: format!("{}{}", prefix, files),
        dest: files,
        checksum: false,
        excludes: config.content_excludes.clone(),
    })
}
