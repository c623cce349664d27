//! Storage trait and common types.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

use crate::{Result, StorageError};

/// Metadata about a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageMetadata {
    /// Key of the object.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// SHA-256 hash of the object content.
    pub checksum: Option<String>,
    /// When the object was stored.
    pub uploaded_at: SystemTime,
    /// Backend-specific location, e.g. `s3://bucket/key`.
    pub location: Option<String>,
}

impl StorageMetadata {
    /// Create new metadata.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            checksum: None,
            uploaded_at: SystemTime::now(),
            location: None,
        }
    }

    /// Set the checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Storage backend for archived log files.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store bytes under a key, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes) -> Result<StorageMetadata>;

    /// Store the contents of a local file under a key.
    async fn put_file(&self, path: &Path, key: &str) -> Result<StorageMetadata> {
        let data = tokio::fs::read(path).await?;
        self.put(key, Bytes::from(data)).await
    }

    /// Human-readable destination for log messages.
    fn describe(&self) -> String;
}

/// Build an object key from a prefix and a file name.
///
/// Trailing slashes on the prefix are dropped; an empty prefix places the
/// object at the root.
///
/// # Examples
///
/// ```
/// use rolewatch_storage::object_key;
///
/// assert_eq!(object_key("audit-logs/", "a.log"), "audit-logs/a.log");
/// assert_eq!(object_key("", "a.log"), "a.log");
/// ```
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

/// Reject keys that are empty or would escape a storage root.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part == ".." || part.is_empty())
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Calculate SHA-256 checksum of data.
pub fn calculate_checksum(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
