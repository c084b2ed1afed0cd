//! Build output inspection.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs;
use tracing::debug;

use crate::domain::models::{
    ArtifactFile, ArtifactKind, DatabaseArtifactInfo, DB_ARCHIVE_NAME, DB_FILE_NAME,
    METADATA_FILE_NAME,
};
use crate::domain::{MonitorError, MonitorResult};

/// Reads the artifact directory. Nothing is cached; every call reflects the
/// filesystem at that moment.
#[derive(Debug, Clone)]
pub struct ArtifactInspector {
    output_dir: PathBuf,
}

impl ArtifactInspector {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub async fn inspect(&self) -> DatabaseArtifactInfo {
        let db = fs::metadata(self.output_dir.join(DB_FILE_NAME)).await.ok();
        let tar = fs::metadata(self.output_dir.join(DB_ARCHIVE_NAME)).await.ok();

        let db_size = db.as_ref().map(std::fs::Metadata::len);
        let db_mtime = db
            .as_ref()
            .and_then(|meta| meta.modified().ok())
            .map(|modified| {
                DateTime::<Local>::from(modified)
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string()
            });
        let tar_size = tar.as_ref().map(std::fs::Metadata::len);

        DatabaseArtifactInfo {
            db_exists: db.is_some(),
            db_size,
            db_mtime,
            tar_exists: tar.is_some(),
            tar_size,
            metadata: self.read_metadata().await,
            db_size_formatted: format_size(db_size),
            tar_size_formatted: format_size(tar_size),
        }
    }

    /// Parsed `metadata.json`; absent or malformed files yield `None`.
    async fn read_metadata(&self) -> Option<serde_json::Value> {
        let path = self.output_dir.join(METADATA_FILE_NAME);
        let bytes = fs::read(&path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring malformed metadata");
                None
            }
        }
    }

    /// Open an artifact for download, named after `date` (`YYYYMMDD`).
    ///
    /// Only a missing file is `ArtifactNotFound`; anything else that stops
    /// the file from being served is `ArtifactUnreadable`.
    pub async fn load(&self, kind: ArtifactKind, date: &str) -> MonitorResult<ArtifactFile> {
        let path = self.output_dir.join(kind.file_name());
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MonitorError::ArtifactNotFound(kind.label().to_string()))
            }
            Err(e) => return Err(unreadable(&path, e)),
        };

        let metadata = file.metadata().await.map_err(|e| unreadable(&path, e))?;
        if !metadata.is_file() {
            return Err(unreadable(&path, "not a regular file"));
        }

        Ok(ArtifactFile {
            kind,
            download_name: kind.download_name(date),
            size: metadata.len(),
            file,
        })
    }
}

fn unreadable(path: &Path, reason: impl std::fmt::Display) -> MonitorError {
    debug!(path = %path.display(), error = %reason, "artifact unreadable");
    MonitorError::ArtifactUnreadable(format!("{}: {reason}", path.display()))
}

/// Human-readable byte count, e.g. `1.50 KB`. `None` renders as `N/A`.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: Option<u64>) -> String {
    let Some(bytes) = size else {
        return "N/A".to_string();
    };

    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TB")
}
