//! CLI command implementations.

pub mod lock;
pub mod serve;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::process::UnixSignaller;
use crate::services::Coordinator;

/// Load configuration and wire a coordinator against the real process table.
pub(crate) fn open_coordinator(config_path: Option<&Path>) -> Result<(Config, Coordinator)> {
    let config = ConfigLoader::load(config_path)?;
    let coordinator = Coordinator::from_config(&config, Arc::new(UnixSignaller))?;
    Ok((config, coordinator))
}
