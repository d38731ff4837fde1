//! Key-value blob persistence: encrypted SQLite store and an in-memory store.

mod encrypted;
mod memory;

pub use encrypted::SecureStore;
pub use memory::MemoryStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encryption failed")]
    Crypto,
    #[error("base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("stored payload too short")]
    Truncated,
}

/// Get/set/delete over opaque string-keyed blobs.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}
