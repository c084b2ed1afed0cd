//! Trivy DB build monitor
//!
//! Supervises a long-running shell script that builds a Trivy vulnerability
//! database. A single build may run at a time; its liveness is tracked through
//! a PID marker file written by the script itself, its merged output is kept
//! in a bounded in-memory buffer mirrored to a log file, and the finished
//! artifacts can be inspected and downloaded over HTTP.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): build state, artifact and config models, errors and ports
//! - **Service Layer** (`services`): lock probe, log sink, build runner and the coordinator
//! - **Infrastructure Layer** (`infrastructure`): configuration loading, logging, OS processes
//! - **Adapters** (`adapters`): the HTTP control surface
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trivy_monitor::{Config, Coordinator, UnixSignaller};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = Coordinator::from_config(&Config::default(), Arc::new(UnixSignaller))?;
//!     println!("{:?}", coordinator.status().await.build);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::http::{build_router, MonitorHttpConfig, MonitorHttpServer};
pub use domain::models::{
    ArtifactKind, BuildOutcome, BuildState, ClearLockOutcome, Config, DatabaseArtifactInfo,
    LogReport, StatusReport,
};
pub use domain::ports::{ProcessSignaller, SignalError};
pub use domain::{MonitorError, MonitorResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::process::UnixSignaller;
pub use services::{BuildCommand, BuildRunner, Coordinator, LockProbe, LogSink};
