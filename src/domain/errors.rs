//! Domain errors for the build monitor.

use thiserror::Error;

/// Caller-facing failures of the build coordinator.
///
/// Failures that happen inside a running build (spawn, streaming) are
/// rendered into the log stream by the runner; they only surface as values
/// of this type when a caller asks for them directly.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("A build is already running")]
    AlreadyRunning { pid: u32 },

    #[error("Stale lock file detected. Please clean it manually.")]
    StaleLock { pid: u32 },

    #[error("Lock file unreadable: {0}")]
    MarkerUnreadable(String),

    #[error("No build is currently running")]
    NoBuildRunning,

    #[error("Build process not found")]
    ProcessNotFound { pid: u32 },

    #[error("Failed to stop build: {reason}")]
    SignalFailed { pid: u32, reason: String },

    #[error("Cannot clear lock while build is running")]
    BuildRunning { pid: u32 },

    #[error("Failed to clear lock: {0}")]
    MarkerRemoval(String),

    #[error("Failed to launch build script: {0}")]
    SpawnFailure(String),

    #[error("Failed to read build output: {0}")]
    StreamFailure(String),

    #[error("{0} not found")]
    ArtifactNotFound(String),

    #[error("Failed to open artifact: {0}")]
    ArtifactUnreadable(String),
}

impl MonitorError {
    /// Process id the error refers to, when there is one.
    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::AlreadyRunning { pid }
            | Self::StaleLock { pid }
            | Self::ProcessNotFound { pid }
            | Self::SignalFailed { pid, .. }
            | Self::BuildRunning { pid } => Some(*pid),
            _ => None,
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
