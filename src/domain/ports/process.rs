use thiserror::Error;

/// Failure to deliver a signal to a build process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("no process with pid {0}")]
    NoSuchProcess(u32),

    #[error("signal to pid {pid} failed: {reason}")]
    Failed { pid: u32, reason: String },
}

/// Process-control port used by the lock probe and the build runner.
///
/// Implementations must not affect the target when probing; only
/// [`ProcessSignaller::terminate`] delivers a signal.
pub trait ProcessSignaller: Send + Sync {
    /// Whether a process with `pid` currently exists (signal-0 semantics).
    fn is_alive(&self, pid: u32) -> bool;

    /// Request graceful shutdown of `pid` (SIGTERM). Does not wait.
    fn terminate(&self, pid: u32) -> Result<(), SignalError>;
}
