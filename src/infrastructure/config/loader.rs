use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, MAX_LOG_LINES};

/// Default project config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "trivy-monitor.yaml";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Build script path cannot be empty")]
    EmptyScriptPath,

    #[error("Lock file and log file must be different paths")]
    LockAndLogCollide,

    #[error("Invalid max_log_lines: {0}. Must be between 1 and {max}", max = MAX_LOG_LINES)]
    InvalidMaxLogLines(usize),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `trivy-monitor.yaml`, or the file given on the command line
    /// 3. Legacy `OUTPUT_DIR`, `CACHE_DIR` and `PORT` variables
    /// 4. Environment variables (`TRIVY_MONITOR_*` prefix, `__` for nesting)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let config: Config = Self::figment(file)
            .extract()
            .with_context(|| format!("Failed to load configuration ({})", file.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(
                Env::raw()
                    .only(&["OUTPUT_DIR", "CACHE_DIR"])
                    .map(|key| format!("artifacts.{}", key.as_str().to_ascii_lowercase()).into()),
            )
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .merge(Env::prefixed("TRIVY_MONITOR_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.build.script_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyScriptPath);
        }

        if config.build.lock_file == config.build.log_file {
            return Err(ConfigError::LockAndLogCollide);
        }

        if config.build.max_log_lines == 0 || config.build.max_log_lines > MAX_LOG_LINES {
            return Err(ConfigError::InvalidMaxLogLines(config.build.max_log_lines));
        }

        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::LogFormat;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.build.max_log_lines, 1000);
        assert_eq!(config.build.lock_file, PathBuf::from("/tmp/build-db-vm.lock"));
        assert_eq!(config.build.log_file, PathBuf::from("/tmp/trivy-db-build.log"));
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
server:
  port: 8080
build:
  script_path: /opt/trivy/build-db-vm.sh
  max_log_lines: 200
artifacts:
  output_dir: /srv/trivy/output
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.build.script_path,
            PathBuf::from("/opt/trivy/build-db-vm.sh")
        );
        assert_eq!(config.build.max_log_lines, 200);
        assert_eq!(config.artifacts.output_dir, PathBuf::from("/srv/trivy/output"));
        assert_eq!(config.logging.format, LogFormat::Json);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_log_lines() {
        let mut config = Config::default();
        config.build.max_log_lines = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxLogLines(0))
        ));
    }

    #[test]
    fn test_validate_log_lines_above_cap() {
        let mut config = Config::default();
        config.build.max_log_lines = MAX_LOG_LINES + 1;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxLogLines(1001))
        ));

        config.build.max_log_lines = MAX_LOG_LINES;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_colliding_paths() {
        let mut config = Config::default();
        config.build.log_file = config.build.lock_file.clone();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::LockAndLogCollide)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_script() {
        let mut config = Config::default();
        config.build.script_path = PathBuf::new();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyScriptPath)
        ));
    }

    #[test]
    fn test_file_and_env_layering() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 7000\nbuild:\n  max_log_lines: 50\nartifacts:\n  output_dir: /from/file"
        )
        .unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("OUTPUT_DIR", Some("/from/legacy-env")),
                ("PORT", Some("7100")),
                ("TRIVY_MONITOR_SERVER__PORT", Some("7200")),
                ("TRIVY_MONITOR_BUILD__LOCK_FILE", Some("/run/build.lock")),
            ],
            || {
                let config = ConfigLoader::load(Some(file.path())).unwrap();

                assert_eq!(config.server.port, 7200, "prefixed env wins");
                assert_eq!(config.artifacts.output_dir, PathBuf::from("/from/legacy-env"));
                assert_eq!(config.build.max_log_lines, 50, "file value persists");
                assert_eq!(config.build.lock_file, PathBuf::from("/run/build.lock"));
            },
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        temp_env::with_vars_unset(["OUTPUT_DIR", "CACHE_DIR", "PORT"], || {
            let config = ConfigLoader::load(Some(Path::new("/nonexistent/monitor.yaml"))).unwrap();
            assert_eq!(config.build.max_log_lines, 1000);
        });
    }
}
