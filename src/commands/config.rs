use clap::Args;
use serde::Serialize;

use stagehand::Config;

use super::CmdResult;

/// Display the effective configuration (defaults merged with file).
#[derive(Args)]
pub struct ConfigArgs {
    /// Show only built-in defaults (ignore stagehand.json)
    #[arg(long)]
    pub builtin: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    pub command: String,
    pub path: String,
    pub config: Config,
}

pub fn run_json(args: ConfigArgs) -> CmdResult<ConfigOutput> {
    let path = Config::path()?;
    let config = if args.builtin {
        Config::default()
    } else {
        Config::load()?
    };

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            path: path.display().to_string(),
            config,
        },
        0,
    ))
}
