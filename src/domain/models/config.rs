use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the build monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Build script and liveness marker configuration
    #[serde(default)]
    pub build: BuildConfig,

    /// Build output locations
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
        }
    }
}

/// Build script configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildConfig {
    /// Executable run (without arguments) for each build
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,

    /// Working directory of the build; defaults to the script's directory
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Liveness marker written by the build script
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,

    /// Durable mirror of the build output
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Number of output lines kept in memory
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,
}

fn default_script_path() -> PathBuf {
    PathBuf::from("build-db-vm.sh")
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("/tmp/build-db-vm.lock")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/trivy-db-build.log")
}

/// Upper bound on retained lines and on the lines a single log request may return.
pub const MAX_LOG_LINES: usize = 1000;

const fn default_max_log_lines() -> usize {
    1000
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script_path: default_script_path(),
            working_dir: None,
            lock_file: default_lock_file(),
            log_file: default_log_file(),
            max_log_lines: default_max_log_lines(),
        }
    }
}

impl BuildConfig {
    /// Directory the script runs in, so it can find sibling resources by
    /// relative path.
    pub fn effective_working_dir(&self) -> PathBuf {
        if let Some(dir) = &self.working_dir {
            return dir.clone();
        }
        match self.script_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Build output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactsConfig {
    /// Directory holding `trivy.db`, `trivy.db.tar.gz` and `metadata.json`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Download cache handed to the build script
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for service log files (optional, if None logs only to stderr)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Enable stderr logging
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// Log rotation policy for `log_dir`
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}
