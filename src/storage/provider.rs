use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Blob storage boundary for uploaded files
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write data under the given key, creating parent directories as
    /// needed. Returns the storage path the key resolved to.
    async fn put(&self, key: &str, data: Bytes) -> Result<String>;

    /// Read data back by key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;
}
