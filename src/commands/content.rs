use clap::Args;

use stagehand::drush::Drush;
use stagehand::exec::SystemRunner;
use stagehand::rsync::Rsync;
use stagehand::{content, preflight, Config, ContentOutput, Error};

use super::CmdResult;

/// Refresh local content (files + database) from production.
#[derive(Args)]
pub struct ContentArgs {}

pub fn run_json(_args: ContentArgs) -> CmdResult<ContentOutput> {
    let config = Config::load()?;
    let runner = SystemRunner::new();
    let drush = Drush::new(config.drush_bin.as_str(), &runner);
    let rsync = Rsync::new(config.rsync_bin.as_str(), &runner);

    let user = preflight::current_user();
    let cwd = std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("resolve cwd".to_string())))?;

    let output = content::run(&config, &drush, &drush, &rsync, &user, &cwd)?;
    Ok((output, 0))
}
