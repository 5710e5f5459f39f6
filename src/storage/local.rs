use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::BlobStore;

/// Local file system blob storage
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<String> {
        let full_path = self.full_path(key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
        }

        let mut file = fs::File::create(&full_path)
            .await
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
        file.write_all(&data)
            .await
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;

        tracing::debug!("Saved file to {:?}", full_path);
        Ok(full_path.to_string_lossy().into_owned())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let full_path = self.full_path(key);
        let data = fs::read(&full_path).await?;
        Ok(Bytes::from(data))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.full_path(key).exists())
    }
}
