//! Domain layer for the build monitor
//!
//! Build state, artifact snapshots, the error taxonomy and the process port.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{MonitorError, MonitorResult};
