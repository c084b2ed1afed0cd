//! Infrastructure layer: configuration, logging and OS process plumbing.

pub mod config;
pub mod logging;
pub mod process;
