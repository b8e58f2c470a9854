//! Public output types for stagehand command responses.
//!
//! Everything here serializes straight into the JSON envelope the CLI
//! prints, so field names are part of the public surface.

use serde::Serialize;

/// One completed pipeline step, in execution order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: String,
    pub target: String,
}

impl StepReport {
    pub fn new(step: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            target: target.into(),
        }
    }
}

/// Result of a content refresh run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOutput {
    pub command: String,
    pub source: String,
    pub destination: String,
    pub steps: Vec<StepReport>,
}

/// Result of a code promotion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeOutput {
    pub command: String,
    pub source: String,
    pub destination_tier: String,
    pub destinations: Vec<String>,
    pub code_path: String,
    pub steps: Vec<StepReport>,
}
