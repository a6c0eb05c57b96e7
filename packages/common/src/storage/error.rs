use std::io;

use thiserror::Error;

/// Failures of a [`BlobStore`](super::BlobStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Used before `configure` gave the store a base directory.
    #[error("storage not initialized; configure a base directory first")]
    NotInitialized,

    #[error("blob not found: {0}")]
    NotFound(String),

    /// Not an id this store could have issued.
    #[error("invalid blob id: {0}")]
    InvalidId(String),

    #[error("storage IO error: {0}")]
    Io(#[from] io::Error),

    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl StorageError {
    /// Whether the blob is absent, either missing on disk or never issued.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidId(_))
    }
}
