//! Storage-specific error type wrapping filesystem and JSON errors.

use std::path::PathBuf;

use roombridge_domain::error::BridgeError;

/// Errors originating from the JSON storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a snapshot file failed.
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file does not contain a valid snapshot.
    #[error("JSON (de)serialization error")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for BridgeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
