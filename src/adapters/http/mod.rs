//! HTTP control surface for the build monitor.

pub mod monitor_http;

pub use monitor_http::{build_router, MonitorHttpConfig, MonitorHttpServer, DEFAULT_LOG_LINES};
