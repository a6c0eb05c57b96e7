pub mod config;
pub mod quantity;
pub mod slug;
pub mod storage;

pub use quantity::{QuantityEntry, QuantityError, Weight};
pub use storage::{BlobId, BlobStore, StorageError};
