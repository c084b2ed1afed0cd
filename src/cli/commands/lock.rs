//! `clear-lock`: remove a liveness marker left behind by a dead build.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use super::open_coordinator;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ClearLockOutcome;

#[derive(Debug, Serialize)]
pub struct ClearLockOutput {
    pub success: bool,
    pub message: String,
    pub lock_file: String,
}

impl ClearLockOutput {
    fn new(outcome: ClearLockOutcome, lock_file: &Path) -> Self {
        Self {
            success: true,
            message: outcome.message().to_string(),
            lock_file: lock_file.display().to_string(),
        }
    }
}

impl CommandOutput for ClearLockOutput {
    fn to_human(&self) -> String {
        format!("{} ({})", self.message, self.lock_file)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let (config, coordinator) = open_coordinator(config_path)?;
    let outcome = coordinator.clear_lock().await?;
    output(&ClearLockOutput::new(outcome, &config.build.lock_file), json_mode);
    Ok(())
}
