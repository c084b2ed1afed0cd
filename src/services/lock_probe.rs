//! Liveness marker inspection.
//!
//! The build script records its pid in a marker file while it runs. The
//! probe turns that claim into a [`BuildState`] by checking whether the
//! recorded process still exists. A marker whose process is gone is
//! reported as stale and left in place for the operator.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use crate::domain::models::BuildState;
use crate::domain::ports::ProcessSignaller;

/// Read-only view of the liveness marker.
#[derive(Clone)]
pub struct LockProbe {
    marker_path: PathBuf,
    signaller: Arc<dyn ProcessSignaller>,
}

impl LockProbe {
    pub fn new(marker_path: impl Into<PathBuf>, signaller: Arc<dyn ProcessSignaller>) -> Self {
        Self {
            marker_path: marker_path.into(),
            signaller,
        }
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Classify the marker. Never mutates anything.
    pub async fn check(&self) -> BuildState {
        let contents = match fs::read_to_string(&self.marker_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return BuildState::Idle,
            Err(e) => {
                return BuildState::Error {
                    message: format!(
                        "Failed to read lock file {}: {e}",
                        self.marker_path.display()
                    ),
                }
            }
        };

        let pid = match parse_pid(&contents) {
            Ok(pid) => pid,
            Err(message) => return BuildState::Error { message },
        };

        if self.signaller.is_alive(pid) {
            BuildState::Running { pid }
        } else {
            BuildState::Stale { pid }
        }
    }

    /// Delete the marker. Returns `false` when there was nothing to delete.
    pub async fn clear(&self) -> std::io::Result<bool> {
        match fs::remove_file(&self.marker_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Parse marker contents as a positive pid.
fn parse_pid(contents: &str) -> Result<u32, String> {
    let trimmed = contents.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|e| format!("invalid pid {trimmed:?} in lock file: {e}"))?;

    // 0 and negative values address process groups
    u32::try_from(value)
        .ok()
        .filter(|pid| *pid > 0 && i32::try_from(*pid).is_ok())
        .ok_or_else(|| format!("invalid pid {value} in lock file"))
}
