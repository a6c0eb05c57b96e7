use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded blobs. Default: "./instance/images".
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    /// Maximum size of a single blob in bytes. Default: 16 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_storage_dir() -> PathBuf {
    "./instance/images".into()
}
fn default_max_blob_size() -> u64 {
    16 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            max_blob_size: default_max_blob_size(),
        }
    }
}
