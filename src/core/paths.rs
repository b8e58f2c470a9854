use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base stagehand config directory (~/.config/stagehand/)
pub fn stagehand() -> Result<PathBuf> {
    let home = env::var("HOME").map_err(|_| {
        Error::internal_unexpected("HOME environment variable not set".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("stagehand"))
}

/// Global stagehand.json config file path
pub fn config_json() -> Result<PathBuf> {
    Ok(stagehand()?.join("stagehand.json"))
}

/// Run-lock directory
pub fn locks() -> Result<PathBuf> {
    Ok(stagehand()?.join("locks"))
}
