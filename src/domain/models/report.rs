//! Responses assembled by the coordinator.

use chrono::Local;
use serde::Serialize;

use super::artifact::DatabaseArtifactInfo;
use super::build::BuildState;

/// Local wall-clock time in the ISO-8601 form used throughout the build log.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub build: BuildState,
    pub database: DatabaseArtifactInfo,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogReport {
    pub logs: Vec<String>,
    pub total_lines: usize,
    pub timestamp: String,
}

/// Result of an admin lock clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearLockOutcome {
    Cleared,
    NothingToClear,
}

impl ClearLockOutcome {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Cleared => "Lock file cleared successfully",
            Self::NothingToClear => "No lock file to clear",
        }
    }
}
