//! Port trait definitions (Hexagonal Architecture)
//!
//! - `ProcessSignaller`: liveness probing and graceful termination of the
//!   external build process

pub mod process;

pub use process::{ProcessSignaller, SignalError};
