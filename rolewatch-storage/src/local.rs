//! Local filesystem storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::{Result, Storage, StorageError, StorageMetadata, calculate_checksum, validate_key};

/// Stores objects as files under a base directory, one file per key.
///
/// Useful as an archive target on a mounted volume and as a stand-in for
/// S3 in tests.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a local storage backend, creating the base directory.
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Storage(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Initialized local storage");

        Ok(Self { base_path })
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: Bytes) -> Result<StorageMetadata> {
        let path = self.full_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let checksum = calculate_checksum(&data);
        fs::write(&path, &data).await?;

        debug!(key = %key, path = %path.display(), size = data.len(), "Stored object");

        Ok(StorageMetadata::new(key, data.len() as u64)
            .with_checksum(checksum)
            .with_location(path.display().to_string()))
    }

    fn describe(&self) -> String {
        format!("file://{}", self.base_path.display())
    }
}
