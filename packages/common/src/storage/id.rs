use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// Length of the canonical hyphenated UUID form.
const HYPHENATED_LEN: usize = 36;

/// Identifier of a stored blob.
///
/// Ids are always generated by the store, never chosen by callers. The only
/// accepted textual form is the hyphenated UUID, which also keeps ids safe to
/// use as file names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(Uuid);

impl BlobId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id previously returned by the store.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.len() != HYPHENATED_LEN {
            return Err(StorageError::InvalidId(format!(
                "expected {HYPHENATED_LEN} characters, got {}",
                s.len()
            )));
        }

        Uuid::try_parse(s)
            .map(Self)
            .map_err(|e| StorageError::InvalidId(e.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0.hyphenated())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Serialize for BlobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
