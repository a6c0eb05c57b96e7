use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use super::error::StorageError;
use super::id::BlobId;
use super::traits::{BlobLocation, BlobStore, BoxReader};

/// Staging directory for in-flight writes, relative to the base directory.
const TMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs are stored flat as `{base_path}/{blob id}`. Writes are staged under
/// `{base_path}/.tmp` and renamed into place, so a blob is either complete or
/// absent.
///
/// The store may be constructed before its directory is known and bound
/// later with [`FilesystemBlobStore::configure`]. Until then every operation
/// fails with [`StorageError::NotInitialized`].
pub struct FilesystemBlobStore {
    base_path: RwLock<Option<PathBuf>>,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a store with no backing directory yet.
    pub fn unconfigured(max_size: u64) -> Self {
        Self {
            base_path: RwLock::new(None),
            max_size,
        }
    }

    /// Create a store bound to `base_path`.
    pub async fn new(base_path: impl Into<PathBuf>, max_size: u64) -> Result<Self, StorageError> {
        let store = Self::unconfigured(max_size);
        store.configure(base_path).await?;
        Ok(store)
    }

    /// Bind the store to a base directory, creating it if needed.
    ///
    /// Safe to call again; later calls rebind the store.
    pub async fn configure(&self, base_path: impl Into<PathBuf>) -> Result<(), StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TMP_DIR)).await?;

        debug!(path = %base_path.display(), "Blob store configured");
        *self
            .base_path
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(base_path);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.base_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The configured base directory.
    pub fn base_path(&self) -> Result<PathBuf, StorageError> {
        self.base_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StorageError::NotInitialized)
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    fn blob_path(base: &Path, id: &BlobId) -> PathBuf {
        base.join(id.to_string())
    }

    /// Path for a temporary file during writes.
    fn temp_path(base: &Path) -> PathBuf {
        base.join(TMP_DIR).join(uuid::Uuid::new_v4().to_string())
    }

    /// Copy `reader` into a staging file, enforcing the size limit.
    ///
    /// Returns the staging path and the number of bytes written. On error the
    /// staging file is removed.
    async fn stage(
        &self,
        base: &Path,
        mut reader: BoxReader,
    ) -> Result<(PathBuf, u64), StorageError> {
        let temp_path = Self::temp_path(base);
        let mut temp_file = fs::File::create(&temp_path).await?;

        let result = async {
            let mut total_bytes: u64 = 0;
            let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer

            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }

                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }

                temp_file.write_all(&buf[..n]).await?;
            }

            temp_file.flush().await?;
            temp_file.sync_all().await?;
            Ok(total_bytes)
        }
        .await;
        drop(temp_file);

        match result {
            Ok(total_bytes) => Ok((temp_path, total_bytes)),
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    /// Move a staged file to its final location.
    async fn commit(temp_path: &Path, blob_path: &Path) -> Result<(), StorageError> {
        if let Err(e) = fs::rename(temp_path, blob_path).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn create(&self, data: &[u8]) -> Result<BlobId, StorageError> {
        self.base_path()?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let reader: BoxReader = Box::new(std::io::Cursor::new(data.to_vec()));
        self.create_stream(reader).await
    }

    async fn create_stream(&self, reader: BoxReader) -> Result<BlobId, StorageError> {
        let base = self.base_path()?;
        let (temp_path, size) = self.stage(&base, reader).await?;

        // A v4 collision is not expected, but an existing blob must never be
        // overwritten by `create`.
        let mut id = BlobId::generate();
        while fs::try_exists(Self::blob_path(&base, &id)).await? {
            id = BlobId::generate();
        }

        Self::commit(&temp_path, &Self::blob_path(&base, &id)).await?;
        debug!(%id, size, "Created blob");
        Ok(id)
    }

    fn read(&self, id: &BlobId) -> Result<BlobLocation, StorageError> {
        let base = self.base_path()?;
        Ok(BlobLocation::new(*id, Self::blob_path(&base, id)))
    }

    async fn update(&self, id: &BlobId, data: &[u8]) -> Result<(), StorageError> {
        let base = self.base_path()?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let reader: BoxReader = Box::new(std::io::Cursor::new(data.to_vec()));
        let (temp_path, size) = self.stage(&base, reader).await?;
        Self::commit(&temp_path, &Self::blob_path(&base, id)).await?;
        debug!(%id, size, "Updated blob");
        Ok(())
    }

    async fn delete(&self, id: &BlobId) -> Result<bool, StorageError> {
        let base = self.base_path()?;
        match fs::remove_file(Self::blob_path(&base, id)).await {
            Ok(()) => {
                debug!(%id, "Deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
