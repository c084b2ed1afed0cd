//! Sliding-window build log.
//!
//! Keeps the most recent lines of build output in memory and mirrors every
//! line to a durable file. One writer (the build task) and any number of
//! readers (status pollers) share it through a `RwLock`; the durable write
//! happens under the write lock, so a snapshot sees an append entirely or
//! not at all, and file order matches buffer order.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default number of lines retained in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Bounded in-memory log with a durable file mirror.
#[derive(Debug)]
pub struct LogSink {
    capacity: usize,
    log_file: PathBuf,
    lines: RwLock<VecDeque<String>>,
}

impl LogSink {
    pub fn new(log_file: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            log_file: log_file.into(),
            lines: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Empty the in-memory buffer. The durable file is left alone.
    pub async fn clear(&self) {
        self.lines.write().await.clear();
    }

    /// Empty the buffer and delete the durable file in one step.
    pub async fn reset(&self) -> std::io::Result<()> {
        let mut lines = self.lines.write().await;
        lines.clear();
        self.remove_file().await
    }

    /// Delete the durable file. A missing file is not an error.
    pub async fn remove_file(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.log_file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Push a line, evicting the oldest when full, and mirror it to disk.
    ///
    /// Disk failures are logged and swallowed: losing the durable copy is
    /// acceptable, interrupting the build stream is not.
    pub async fn append(&self, line: impl Into<String>) {
        let line = line.into();
        let mut lines = self.lines.write().await;

        if let Err(e) = self.write_durable(&line).await {
            warn!(
                path = %self.log_file.display(),
                error = %e,
                "failed to mirror build output to log file"
            );
        }

        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    async fn write_durable(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// The most recent `min(max_lines, capacity, len)` lines, oldest first.
    ///
    /// Falls back to the tail of the durable file when the buffer is empty,
    /// e.g. after a restart of the monitor.
    pub async fn snapshot(&self, max_lines: usize) -> Vec<String> {
        let count = max_lines.min(self.capacity);
        if count == 0 {
            return Vec::new();
        }

        {
            let lines = self.lines.read().await;
            if !lines.is_empty() {
                let skip = lines.len().saturating_sub(count);
                return lines.iter().skip(skip).cloned().collect();
            }
        }

        self.tail_file(count).await
    }

    async fn tail_file(&self, count: usize) -> Vec<String> {
        let bytes = match fs::read(&self.log_file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %self.log_file.display(), error = %e, "log file unreadable");
                }
                return Vec::new();
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let all: Vec<&str> = text.split_inclusive('\n').collect();
        let skip = all.len().saturating_sub(count);
        all[skip..].iter().map(|line| (*line).to_string()).collect()
    }

    /// Number of lines currently retained in memory.
    pub async fn len(&self) -> usize {
        self.lines.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lines.read().await.is_empty()
    }
}
