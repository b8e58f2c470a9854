use clap::Args;

use stagehand::drush::Drush;
use stagehand::exec::SystemRunner;
use stagehand::rsync::Rsync;
use stagehand::{code, preflight, CodeOutput, Config, Error};

use super::CmdResult;

/// Promote the local code tree one tier up.
#[derive(Args)]
pub struct CodeArgs {}

pub fn run_json(_args: CodeArgs) -> CmdResult<CodeOutput> {
    let config = Config::load()?;
    let runner = SystemRunner::new();
    let drush = Drush::new(config.drush_bin.as_str(), &runner);
    let rsync = Rsync::new(config.rsync_bin.as_str(), &runner);

    let user = preflight::current_user();
    let cwd = std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("resolve cwd".to_string())))?;

    let output = code::run(&config, &drush, &drush, &rsync, &user, &cwd)?;
    Ok((output, 0))
}
