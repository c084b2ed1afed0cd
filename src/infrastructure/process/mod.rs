//! Unix process plumbing
//!
//! - nix-backed [`ProcessSignaller`]
//! - merged stdout/stderr pipe for build scripts

use std::fs::File;
use std::process::Stdio;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{pipe2, Pid};

use crate::domain::ports::{ProcessSignaller, SignalError};

pub mod mock;

pub use mock::MockSignaller;

/// Signals processes through `kill(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSignaller;

impl UnixSignaller {
    pub const fn new() -> Self {
        Self
    }
}

fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .map(Pid::from_raw)
}

impl ProcessSignaller for UnixSignaller {
    fn is_alive(&self, pid: u32) -> bool {
        let Some(target) = to_pid(pid) else {
            return false;
        };

        match kill(target, None) {
            Ok(()) => true,
            // Exists, but owned by another user
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn terminate(&self, pid: u32) -> Result<(), SignalError> {
        let target = to_pid(pid).ok_or(SignalError::NoSuchProcess(pid))?;

        match kill(target, Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(SignalError::NoSuchProcess(pid)),
            Err(errno) => Err(SignalError::Failed {
                pid,
                reason: errno.desc().to_string(),
            }),
        }
    }
}

/// A pipe whose write end is shared by a child's stdout and stderr.
///
/// Both descriptors are close-on-exec; the child only receives the copies
/// installed as its fds 1 and 2.
pub struct MergedOutput {
    pub reader: File,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

impl MergedOutput {
    pub fn new() -> std::io::Result<Self> {
        let (read_fd, write_fd) = pipe2(OFlag::O_CLOEXEC).map_err(std::io::Error::from)?;
        let write_clone = write_fd.try_clone()?;

        Ok(Self {
            reader: File::from(read_fd),
            stdout: Stdio::from(write_fd),
            stderr: Stdio::from(write_clone),
        })
    }
}
