//! Service layer: the build coordinator and its components.

pub mod artifact_inspector;
pub mod build_runner;
pub mod coordinator;
pub mod lock_probe;
pub mod log_sink;

pub use artifact_inspector::{format_size, ArtifactInspector};
pub use build_runner::{BuildCommand, BuildRunner};
pub use coordinator::Coordinator;
pub use lock_probe::LockProbe;
pub use log_sink::{LogSink, DEFAULT_LOG_CAPACITY};
