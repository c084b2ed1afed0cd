//! Logging infrastructure
//!
//! Structured service logging using tracing and tracing-subscriber:
//! - JSON or pretty formatting on stderr
//! - Optional rolling log files via tracing-appender
//!
//! Build output does not go through here; it is captured by the log sink.

pub mod logger;

pub use logger::{parse_log_level, LoggerImpl};
