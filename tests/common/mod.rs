//! Common test utilities for integration tests
//!
//! Provides a throwaway build workspace (script, lock file, log file and
//! output directory inside one temp dir) and polling helpers.

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use trivy_monitor::domain::models::Config;
use trivy_monitor::{Coordinator, ProcessSignaller};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A build script plus every path the monitor touches, rooted in a temp dir.
pub struct BuildWorkspace {
    pub dir: TempDir,
    pub config: Config,
}

impl BuildWorkspace {
    pub fn new() -> Self {
        let dir = temp_dir();
        let root = dir.path();

        let mut config = Config::default();
        config.build.script_path = root.join("build-db-vm.sh");
        config.build.lock_file = root.join("build-db-vm.lock");
        config.build.log_file = root.join("trivy-db-build.log");
        config.build.max_log_lines = 50;
        config.artifacts.output_dir = root.join("output");
        config.artifacts.cache_dir = root.join("cache");

        Self { dir, config }
    }

    pub fn lock_file(&self) -> &Path {
        &self.config.build.lock_file
    }

    pub fn log_file(&self) -> &Path {
        &self.config.build.log_file
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.artifacts.output_dir
    }

    /// Install `body` as the build script. `$LOCK` inside the body refers
    /// to the configured lock file.
    pub fn write_script(&self, body: &str) -> PathBuf {
        let path = self.config.build.script_path.clone();
        let script = format!(
            "#!/bin/sh\nLOCK='{}'\n{body}\n",
            self.lock_file().display()
        );
        fs::write(&path, script).expect("Failed to write build script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make build script executable");
        path
    }

    pub fn write_lock(&self, contents: &str) {
        fs::write(self.lock_file(), contents).expect("Failed to write lock file");
    }

    pub fn write_artifact(&self, name: &str, contents: &[u8]) {
        fs::create_dir_all(self.output_dir()).expect("Failed to create output dir");
        fs::write(self.output_dir().join(name), contents).expect("Failed to write artifact");
    }

    pub fn coordinator(&self, signaller: Arc<dyn ProcessSignaller>) -> Arc<Coordinator> {
        Arc::new(
            Coordinator::from_config(&self.config, signaller)
                .expect("Failed to build coordinator"),
        )
    }
}

/// Wait for an async condition to be true with timeout
///
/// Polls the predicate every 50ms until it returns true or timeout is reached.
pub async fn wait_until<F, Fut>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    false
}
