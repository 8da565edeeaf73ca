//! Error types for the country dataset pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Dataset pipeline errors
///
/// Data-quality problems inside a readable dataset are not errors here; the
/// validator reports those as findings.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Malformed source {path}: {source}")]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write artifact {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote fetch failed for {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    #[error("Malformed remote dataset: {0}")]
    MalformedRemote(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatasetError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
