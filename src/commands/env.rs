use clap::Args;
use serde::Serialize;

use stagehand::drush::Drush;
use stagehand::exec::SystemRunner;
use stagehand::identity::EnvId;
use stagehand::registry::{EnvRecord, Registry};
use stagehand::{topology, Config, ErrorCode};

use super::CmdResult;

/// Show the local environment and where promotions would land.
#[derive(Args)]
pub struct EnvArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvOutput {
    pub command: String,
    pub local: EnvRecord,
    pub tier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_target: Option<String>,
    pub destinations: Vec<EnvRecord>,
}

pub fn run_json(_args: EnvArgs) -> CmdResult<EnvOutput> {
    let config = Config::load()?;
    let runner = SystemRunner::new();
    let drush = Drush::new(config.drush_bin.as_str(), &runner);

    let identity = drush.local_identity()?;
    let local = EnvId::parse(&identity)?;
    let record = drush.describe(&identity)?;

    let target = local.tier.promotion_target();
    let destinations = match target {
        Some(tier) => match topology::enumerate_destinations(&drush, tier) {
            Ok(records) => records,
            // A tier with nothing registered is a finding, not a failure.
            Err(e) if e.code == ErrorCode::NoDestinationFound => Vec::new(),
            Err(e) => return Err(e),
        },
        None => Vec::new(),
    };

    Ok((
        EnvOutput {
            command: "env.show".to_string(),
            local: record,
            tier: local.tier.token().to_string(),
            promotion_target: target.map(|t| t.token().to_string()),
            destinations,
        },
        0,
    ))
}
