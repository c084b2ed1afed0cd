pub mod artifact;
pub mod build;
pub mod config;
pub mod report;

pub use artifact::{
    ArtifactFile, ArtifactKind, DatabaseArtifactInfo, DB_ARCHIVE_NAME, DB_FILE_NAME,
    METADATA_FILE_NAME,
};
pub use build::{BuildOutcome, BuildState};
pub use config::{
    ArtifactsConfig, BuildConfig, Config, LogFormat, LoggingConfig, RotationPolicy, ServerConfig,
    MAX_LOG_LINES,
};
pub use report::{local_timestamp, ClearLockOutcome, LogReport, StatusReport};
