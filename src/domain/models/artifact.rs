//! Database artifact snapshot.

use serde::Serialize;
use serde_json::Value;

/// File name of the raw database inside the output directory.
pub const DB_FILE_NAME: &str = "trivy.db";
/// File name of the compressed database archive.
pub const DB_ARCHIVE_NAME: &str = "trivy.db.tar.gz";
/// File name of the build metadata document.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Snapshot of the build outputs, recomputed on every status query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseArtifactInfo {
    pub db_exists: bool,
    pub db_size: Option<u64>,
    pub db_mtime: Option<String>,
    pub tar_exists: bool,
    pub tar_size: Option<u64>,
    pub metadata: Option<Value>,
    pub db_size_formatted: String,
    pub tar_size_formatted: String,
}

/// Downloadable build outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    DatabaseArchive,
    Metadata,
}

impl ArtifactKind {
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::DatabaseArchive => DB_ARCHIVE_NAME,
            Self::Metadata => METADATA_FILE_NAME,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::DatabaseArchive => "application/gzip",
            Self::Metadata => "application/json",
        }
    }

    /// Human label used in "not found" messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::DatabaseArchive => "Database file",
            Self::Metadata => "Metadata file",
        }
    }

    /// Attachment name offered to the client, stamped with `date` (`YYYYMMDD`).
    pub fn download_name(self, date: &str) -> String {
        match self {
            Self::DatabaseArchive => format!("trivy-db-{date}.tar.gz"),
            Self::Metadata => format!("metadata-{date}.json"),
        }
    }
}

/// An artifact opened on disk, streamed to the client as it is read.
#[derive(Debug)]
pub struct ArtifactFile {
    pub kind: ArtifactKind,
    pub download_name: String,
    pub size: u64,
    pub file: tokio::fs::File,
}
