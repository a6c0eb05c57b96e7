use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use super::error::StorageError;
use super::id::BlobId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Where a blob lives, as returned by [`BlobStore::read`].
///
/// Resolving a location does not touch the disk. Callers decide whether a
/// missing blob is a 404 or an error by probing with [`BlobLocation::exists`]
/// or by handling [`StorageError::NotFound`] from [`BlobLocation::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    id: BlobId,
    path: PathBuf,
}

impl BlobLocation {
    pub fn new(id: BlobId, path: PathBuf) -> Self {
        Self { id, path }
    }

    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether a blob is currently stored here.
    pub async fn exists(&self) -> Result<bool, StorageError> {
        Ok(fs::try_exists(&self.path).await?)
    }

    /// Open the blob for streaming.
    pub async fn open(&self) -> Result<BoxReader, StorageError> {
        match fs::File::open(&self.path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(self.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of the stored blob in bytes.
    pub async fn size(&self) -> Result<u64, StorageError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(self.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Identity-addressed blob storage.
///
/// Every `create` issues a new id, even for identical payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a freshly generated id.
    async fn create(&self, data: &[u8]) -> Result<BlobId, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.create_stream(reader).await
    }

    /// Store data from an async reader under a freshly generated id.
    async fn create_stream(&self, reader: BoxReader) -> Result<BlobId, StorageError>;

    /// Resolve the location of a blob without checking that it exists.
    fn read(&self, id: &BlobId) -> Result<BlobLocation, StorageError>;

    /// Open a blob for streaming, failing with `NotFound` if it is missing.
    async fn open(&self, id: &BlobId) -> Result<BoxReader, StorageError> {
        self.read(id)?.open().await
    }

    /// Retrieve all bytes of a blob.
    async fn get(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Check whether a blob exists.
    async fn exists(&self, id: &BlobId) -> Result<bool, StorageError> {
        self.read(id)?.exists().await
    }

    /// Overwrite the blob at `id`, creating it if absent.
    async fn update(&self, id: &BlobId, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, id: &BlobId) -> Result<bool, StorageError>;
}
