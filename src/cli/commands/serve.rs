//! `serve`: run the HTTP monitor until interrupted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info, warn};

use crate::adapters::http::{MonitorHttpConfig, MonitorHttpServer};
use crate::domain::models::{BuildState, Config};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::infrastructure::process::UnixSignaller;
use crate::services::Coordinator;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load(config_path)?;
    args.apply(&mut config);
    ConfigLoader::validate(&config)?;

    let _logger = LoggerImpl::init(&config.logging)?;

    tokio::fs::create_dir_all(&config.artifacts.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.artifacts.output_dir.display()
            )
        })?;

    let coordinator = Arc::new(Coordinator::from_config(&config, Arc::new(UnixSignaller))?);

    info!(
        script = %config.build.script_path.display(),
        lock_file = %config.build.lock_file.display(),
        log_file = %config.build.log_file.display(),
        output_dir = %config.artifacts.output_dir.display(),
        "Starting Trivy DB build monitor"
    );

    match coordinator.status().await.build {
        BuildState::Stale { pid } => warn!(
            pid,
            "Lock file names a dead process; builds are refused until it is cleared"
        ),
        BuildState::Running { pid } => info!(pid, "Build already in progress"),
        BuildState::Error { message } => warn!(%message, "Lock file is unreadable"),
        BuildState::Idle => {}
    }

    MonitorHttpServer::new(coordinator, MonitorHttpConfig::from(&config.server))
        .serve_with_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
