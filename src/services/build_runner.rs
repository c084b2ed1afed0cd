//! Build lifecycle: launch, stream, await, record.
//!
//! At most one build runs at a time. That is enforced only by the lock
//! probe precondition in [`BuildRunner::start`]: between the probe reporting
//! idle and the script writing its marker, a second start request can pass
//! the same check. The window is accepted; closing it would take an advisory
//! lock shared with the script.

use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::models::{local_timestamp, ArtifactsConfig, BuildConfig, BuildOutcome, BuildState};
use crate::domain::ports::{ProcessSignaller, SignalError};
use crate::domain::{MonitorError, MonitorResult};
use crate::infrastructure::process::MergedOutput;
use crate::services::lock_probe::LockProbe;
use crate::services::log_sink::LogSink;

/// How to invoke the build script.
#[derive(Debug, Clone)]
pub struct BuildCommand {
    pub script_path: PathBuf,
    pub working_dir: PathBuf,
    pub env: Vec<(String, OsString)>,
}

impl BuildCommand {
    pub fn new(script_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            working_dir: working_dir.into(),
            env: Vec::new(),
        }
    }

    /// Resolve paths against the current directory so the script is found
    /// regardless of the working directory it runs in.
    pub fn from_config(build: &BuildConfig, artifacts: &ArtifactsConfig) -> std::io::Result<Self> {
        let script_path = std::path::absolute(&build.script_path)?;
        let working_dir = std::path::absolute(build.effective_working_dir())?;

        Ok(Self::new(script_path, working_dir)
            .with_env("OUTPUT_DIR", std::path::absolute(&artifacts.output_dir)?)
            .with_env("CACHE_DIR", std::path::absolute(&artifacts.cache_dir)?))
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Owns the build slot.
pub struct BuildRunner {
    command: BuildCommand,
    probe: LockProbe,
    sink: Arc<LogSink>,
    signaller: Arc<dyn ProcessSignaller>,
}

impl BuildRunner {
    pub fn new(
        command: BuildCommand,
        probe: LockProbe,
        sink: Arc<LogSink>,
        signaller: Arc<dyn ProcessSignaller>,
    ) -> Self {
        Self {
            command,
            probe,
            sink,
            signaller,
        }
    }

    /// Start a build in the background.
    ///
    /// Refuses when the probe reports anything but idle; a stale marker is
    /// never cleared here, it is evidence for the operator. The returned
    /// handle resolves when the script exits; dropping it detaches the build.
    pub async fn start(&self) -> MonitorResult<JoinHandle<BuildOutcome>> {
        match self.probe.check().await {
            BuildState::Idle => {}
            BuildState::Running { pid } => return Err(MonitorError::AlreadyRunning { pid }),
            BuildState::Stale { pid } => return Err(MonitorError::StaleLock { pid }),
            BuildState::Error { message } => return Err(MonitorError::MarkerUnreadable(message)),
        }

        if let Err(e) = self.sink.reset().await {
            warn!(
                path = %self.sink.log_file().display(),
                error = %e,
                "failed to remove previous build log"
            );
        }
        self.sink
            .append(format!("[{}] Starting build process...\n", local_timestamp()))
            .await;

        info!(script = %self.command.script_path.display(), "build started");

        let command = self.command.clone();
        let sink = Arc::clone(&self.sink);
        Ok(tokio::spawn(run_build(command, sink)))
    }

    /// Ask the running build to shut down (SIGTERM). Does not wait; the
    /// exit is picked up by the streaming task.
    pub async fn stop(&self) -> MonitorResult<u32> {
        let BuildState::Running { pid } = self.probe.check().await else {
            return Err(MonitorError::NoBuildRunning);
        };

        match self.signaller.terminate(pid) {
            Ok(()) => {
                info!(pid, "stop signal sent to build");
                self.sink
                    .append(format!(
                        "\n[{}] Build stop requested (PID: {pid})\n",
                        local_timestamp()
                    ))
                    .await;
                Ok(pid)
            }
            Err(SignalError::NoSuchProcess(pid)) => Err(MonitorError::ProcessNotFound { pid }),
            Err(SignalError::Failed { pid, reason }) => {
                Err(MonitorError::SignalFailed { pid, reason })
            }
        }
    }
}

/// Body of the background build task. Never fails: every error ends up as
/// the terminal log line.
async fn run_build(command: BuildCommand, sink: Arc<LogSink>) -> BuildOutcome {
    let outcome = match execute(&command, &sink).await {
        Ok(outcome) => outcome,
        Err(e) => BuildOutcome::Errored {
            message: e.to_string(),
        },
    };

    sink.append(format!("\n[{}] {}\n", local_timestamp(), outcome.describe()))
        .await;

    match &outcome {
        BuildOutcome::Succeeded => info!("build completed"),
        BuildOutcome::Failed { code } => warn!(exit_code = code, "build failed"),
        BuildOutcome::Terminated { signal } => warn!(signal, "build terminated by signal"),
        BuildOutcome::Errored { message } => error!(error = %message, "build errored"),
    }

    outcome
}

async fn execute(command: &BuildCommand, sink: &LogSink) -> MonitorResult<BuildOutcome> {
    let merged = MergedOutput::new().map_err(|e| MonitorError::SpawnFailure(e.to_string()))?;

    let mut cmd = Command::new(&command.script_path);
    cmd.current_dir(&command.working_dir)
        .envs(command.env.iter().map(|(key, value)| (key, value)))
        .stdin(Stdio::null())
        .stdout(merged.stdout)
        .stderr(merged.stderr);

    let mut child = cmd
        .spawn()
        .map_err(|e| MonitorError::SpawnFailure(format!("{}: {e}", command.script_path.display())))?;
    // The command still holds our copies of the write end; EOF only
    // arrives once they are closed.
    drop(cmd);

    let reader = tokio::fs::File::from_std(merged.reader);
    let streamed = forward_lines(reader, sink).await;

    let status = child
        .wait()
        .await
        .map_err(|e| MonitorError::StreamFailure(e.to_string()))?;
    streamed?;

    Ok(outcome_from(status))
}

/// Forward output to the sink one line at a time, in arrival order.
async fn forward_lines<R>(reader: R, sink: &LogSink) -> MonitorResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| MonitorError::StreamFailure(e.to_string()))?;
        if read == 0 {
            return Ok(());
        }
        sink.append(String::from_utf8_lossy(&buf).into_owned()).await;
    }
}

fn outcome_from(status: ExitStatus) -> BuildOutcome {
    match (status.code(), status.signal()) {
        (Some(0), _) => BuildOutcome::Succeeded,
        (Some(code), _) => BuildOutcome::Failed { code },
        (None, Some(signal)) => BuildOutcome::Terminated { signal },
        (None, None) => BuildOutcome::Errored {
            message: "build exited without a status".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::MockSignaller;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        sink: Arc<LogSink>,
        signaller: Arc<MockSignaller>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let sink = Arc::new(LogSink::new(dir.path().join("build.log"), 1000));
            Self {
                dir,
                sink,
                signaller: Arc::new(MockSignaller::new()),
            }
        }

        fn lock_path(&self) -> PathBuf {
            self.dir.path().join("build.lock")
        }

        fn script(&self, body: &str) -> PathBuf {
            let path = self.dir.path().join("build.sh");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn runner(&self, script: PathBuf) -> BuildRunner {
            let working_dir = script.parent().unwrap().to_path_buf();
            let signaller: Arc<dyn ProcessSignaller> = self.signaller.clone();
            BuildRunner::new(
                BuildCommand::new(script, working_dir).with_env("OUTPUT_DIR", "/srv/output"),
                LockProbe::new(self.lock_path(), Arc::clone(&signaller)),
                Arc::clone(&self.sink),
                signaller,
            )
        }
    }

    async fn finish(handle: JoinHandle<BuildOutcome>) -> BuildOutcome {
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("build did not finish")
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_build_streams_merged_output() {
        let fx = Fixture::new();
        let runner = fx.runner(fx.script("echo hello\necho oops 1>&2\necho bye"));

        let outcome = finish(runner.start().await.unwrap()).await;
        assert_eq!(outcome, BuildOutcome::Succeeded);

        let logs = fx.sink.snapshot(1000).await;
        assert!(logs[0].contains("Starting build process..."));
        assert_eq!(&logs[1..4], ["hello\n", "oops\n", "bye\n"]);
        assert_eq!(logs.len(), 5);
        assert!(logs[4].contains("Build completed successfully"));
    }

    #[tokio::test]
    async fn test_failed_build_records_exit_code() {
        let fx = Fixture::new();
        let runner = fx.runner(fx.script("echo working\nexit 3"));

        let outcome = finish(runner.start().await.unwrap()).await;
        assert_eq!(outcome, BuildOutcome::Failed { code: 3 });

        let logs = fx.sink.snapshot(1000).await;
        let last = logs.last().unwrap();
        assert!(last.contains("Build failed with exit code 3"));
        let markers = logs
            .iter()
            .filter(|line| line.contains("Build failed") || line.contains("Build completed"))
            .count();
        assert_eq!(markers, 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_logged_not_raised() {
        let fx = Fixture::new();
        let runner = fx.runner(fx.dir.path().join("missing.sh"));

        let outcome = finish(runner.start().await.unwrap()).await;
        assert!(matches!(outcome, BuildOutcome::Errored { .. }));

        let logs = fx.sink.snapshot(1000).await;
        assert_eq!(logs.len(), 2);
        assert!(logs[1].contains("Build error:"));
    }

    #[tokio::test]
    async fn test_script_runs_in_working_dir_with_env() {
        let fx = Fixture::new();
        let runner = fx.runner(fx.script("pwd -P\necho \"$OUTPUT_DIR\""));

        finish(runner.start().await.unwrap()).await;

        let logs = fx.sink.snapshot(1000).await;
        let expected_dir = fs::canonicalize(fx.dir.path()).unwrap();
        assert_eq!(logs[1].trim_end(), expected_dir.to_str().unwrap());
        assert_eq!(logs[2], "/srv/output\n");
    }

    #[tokio::test]
    async fn test_start_resets_previous_log() {
        let fx = Fixture::new();
        fx.sink.append("old build line\n").await;
        let runner = fx.runner(fx.script("echo new"));

        finish(runner.start().await.unwrap()).await;

        let contents = fs::read_to_string(fx.sink.log_file()).unwrap();
        assert!(!contents.contains("old build line"));
        assert!(contents.contains("new\n"));
        assert!(!fx.sink.snapshot(1000).await.iter().any(|l| l.contains("old")));
    }

    #[tokio::test]
    async fn test_start_refused_while_running() {
        let fx = Fixture::new();
        fs::write(fx.lock_path(), "4242").unwrap();
        fx.signaller.set_alive(4242, true);
        fx.sink.append("previous\n").await;
        let runner = fx.runner(fx.script("echo should-not-run"));

        let err = runner.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::AlreadyRunning { pid: 4242 }));
        assert_eq!(fx.sink.snapshot(1000).await, vec!["previous\n"]);
        assert_eq!(fs::read_to_string(fx.sink.log_file()).unwrap(), "previous\n");
    }

    #[tokio::test]
    async fn test_start_refused_on_stale_lock() {
        let fx = Fixture::new();
        fs::write(fx.lock_path(), "4242").unwrap();
        let runner = fx.runner(fx.script("echo should-not-run"));

        let err = runner.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::StaleLock { pid: 4242 }));
        assert!(fx.lock_path().exists(), "stale lock must not be auto-cleared");
        assert!(fx.sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_start_refused_on_unreadable_marker() {
        let fx = Fixture::new();
        fs::write(fx.lock_path(), "garbage").unwrap();
        let runner = fx.runner(fx.script("echo should-not-run"));

        let err = runner.start().await.unwrap_err();
        assert!(matches!(err, MonitorError::MarkerUnreadable(_)));
    }

    #[tokio::test]
    async fn test_stop_without_build() {
        let fx = Fixture::new();
        let runner = fx.runner(fx.script("true"));

        let err = runner.stop().await.unwrap_err();
        assert!(matches!(err, MonitorError::NoBuildRunning));
        assert!(fx.signaller.terminated().is_empty());
    }

    #[tokio::test]
    async fn test_stop_signals_recorded_pid_once() {
        let fx = Fixture::new();
        fs::write(fx.lock_path(), "4242").unwrap();
        fx.signaller.set_alive(4242, true);
        let runner = fx.runner(fx.script("true"));

        assert_eq!(runner.stop().await.unwrap(), 4242);
        assert_eq!(fx.signaller.terminated(), vec![4242]);

        let logs = fx.sink.snapshot(10).await;
        assert!(logs.last().unwrap().contains("Build stop requested (PID: 4242)"));
    }

    #[tokio::test]
    async fn test_stop_when_process_vanished() {
        let dir = TempDir::new().unwrap();
        let lock = dir.path().join("build.lock");
        fs::write(&lock, "4242").unwrap();
        let signaller: Arc<dyn ProcessSignaller> =
            Arc::new(MockSignaller::with_alive([4242]).vanishing());
        let runner = BuildRunner::new(
            BuildCommand::new("/bin/true", dir.path()),
            LockProbe::new(&lock, Arc::clone(&signaller)),
            Arc::new(LogSink::new(dir.path().join("build.log"), 10)),
            signaller,
        );

        let err = runner.stop().await.unwrap_err();
        assert!(matches!(err, MonitorError::ProcessNotFound { pid: 4242 }));
    }

    #[test]
    fn test_from_config_makes_paths_absolute() {
        let build = BuildConfig {
            script_path: PathBuf::from("scripts/build-db-vm.sh"),
            ..Default::default()
        };
        let command = BuildCommand::from_config(&build, &ArtifactsConfig::default()).unwrap();

        assert!(command.script_path.is_absolute());
        assert!(command.working_dir.ends_with("scripts"));
        assert!(command.env.iter().any(|(key, _)| key == "OUTPUT_DIR"));
        assert!(command.env.iter().any(|(key, _)| key == "CACHE_DIR"));
    }
}
