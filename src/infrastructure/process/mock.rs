//! Mock process signaller for testing

use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::ports::{ProcessSignaller, SignalError};

/// In-memory signaller: a fixed set of "alive" pids, and a record of every
/// termination request it receives.
#[derive(Debug, Default)]
pub struct MockSignaller {
    alive: Mutex<HashSet<u32>>,
    terminated: Mutex<Vec<u32>>,
    vanish_on_terminate: bool,
}

impl MockSignaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signaller that reports the given pids as alive.
    pub fn with_alive(pids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            alive: Mutex::new(pids.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Probe still sees the process, but it is gone by the time it is signalled.
    pub fn vanishing(mut self) -> Self {
        self.vanish_on_terminate = true;
        self
    }

    pub fn set_alive(&self, pid: u32, alive: bool) {
        let mut set = self.alive.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if alive {
            set.insert(pid);
        } else {
            set.remove(&pid);
        }
    }

    /// Pids that received a termination request, in order.
    pub fn terminated(&self) -> Vec<u32> {
        self.terminated
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ProcessSignaller for MockSignaller {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&pid)
    }

    fn terminate(&self, pid: u32) -> Result<(), SignalError> {
        if self.vanish_on_terminate || !self.is_alive(pid) {
            return Err(SignalError::NoSuchProcess(pid));
        }
        self.terminated
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(pid);
        Ok(())
    }
}
