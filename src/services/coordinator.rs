//! Façade over the build slot used by the HTTP API and the CLI.

use std::sync::Arc;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::models::{
    local_timestamp, ArtifactFile, ArtifactKind, BuildOutcome, BuildState, ClearLockOutcome,
    Config, LogReport, StatusReport, MAX_LOG_LINES,
};
use crate::domain::ports::ProcessSignaller;
use crate::domain::{MonitorError, MonitorResult};
use crate::services::artifact_inspector::ArtifactInspector;
use crate::services::build_runner::{BuildCommand, BuildRunner};
use crate::services::lock_probe::LockProbe;
use crate::services::log_sink::LogSink;

/// Process-wide owner of the log sink and the build slot.
pub struct Coordinator {
    probe: LockProbe,
    sink: Arc<LogSink>,
    runner: BuildRunner,
    artifacts: ArtifactInspector,
}

impl Coordinator {
    pub fn new(
        probe: LockProbe,
        sink: Arc<LogSink>,
        runner: BuildRunner,
        artifacts: ArtifactInspector,
    ) -> Self {
        Self {
            probe,
            sink,
            runner,
            artifacts,
        }
    }

    /// Wire up every component from configuration.
    pub fn from_config(
        config: &Config,
        signaller: Arc<dyn ProcessSignaller>,
    ) -> std::io::Result<Self> {
        let probe = LockProbe::new(&config.build.lock_file, Arc::clone(&signaller));
        let sink = Arc::new(LogSink::new(
            &config.build.log_file,
            config.build.max_log_lines,
        ));
        let command = BuildCommand::from_config(&config.build, &config.artifacts)?;
        let runner = BuildRunner::new(command, probe.clone(), Arc::clone(&sink), signaller);

        Ok(Self::new(
            probe,
            sink,
            runner,
            ArtifactInspector::new(&config.artifacts.output_dir),
        ))
    }

    pub fn log_sink(&self) -> &LogSink {
        &self.sink
    }

    /// Current build state and artifact snapshot. Never fails; marker
    /// problems are reported as [`BuildState::Error`].
    pub async fn status(&self) -> StatusReport {
        StatusReport {
            build: self.probe.check().await,
            database: self.artifacts.inspect().await,
            timestamp: local_timestamp(),
        }
    }

    /// Recent build output, at most the sink's capacity and never more
    /// than [`MAX_LOG_LINES`].
    pub async fn logs(&self, max_lines: usize) -> LogReport {
        let max_lines = max_lines.min(self.sink.capacity()).min(MAX_LOG_LINES);
        LogReport {
            logs: self.sink.snapshot(max_lines).await,
            total_lines: self.sink.len().await,
            timestamp: local_timestamp(),
        }
    }

    pub async fn start_build(&self) -> MonitorResult<JoinHandle<BuildOutcome>> {
        self.runner.start().await
    }

    pub async fn stop_build(&self) -> MonitorResult<u32> {
        self.runner.stop().await
    }

    /// Remove the liveness marker. Refused while it guards a live process.
    pub async fn clear_lock(&self) -> MonitorResult<ClearLockOutcome> {
        if let BuildState::Running { pid } = self.probe.check().await {
            return Err(MonitorError::BuildRunning { pid });
        }

        match self.probe.clear().await {
            Ok(true) => {
                info!(path = %self.probe.marker_path().display(), "lock file cleared");
                Ok(ClearLockOutcome::Cleared)
            }
            Ok(false) => Ok(ClearLockOutcome::NothingToClear),
            Err(e) => Err(MonitorError::MarkerRemoval(e.to_string())),
        }
    }

    /// Read a build artifact for download, named with today's date.
    pub async fn artifact(&self, kind: ArtifactKind) -> MonitorResult<ArtifactFile> {
        let date = Local::now().format("%Y%m%d").to_string();
        self.artifacts.load(kind, &date).await
    }
}
