//! AWS S3 storage backend.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, config::Region, primitives::ByteStream};
use bytes::Bytes;
use tracing::{debug, info};

use crate::{Result, Storage, StorageError, StorageMetadata, calculate_checksum};

/// S3 storage configuration.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// S3 bucket name.
    pub bucket: String,
    /// AWS region.
    pub region: Option<String>,
}

impl S3Config {
    /// Create configuration for a bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// AWS S3 storage backend.
///
/// Credentials come from the default AWS provider chain (environment,
/// profile, instance role).
pub struct S3Storage {
    client: Client,
    config: S3Config,
}

impl S3Storage {
    /// Create a new S3 storage backend.
    pub async fn new(config: S3Config) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Config("S3 bucket name is empty".to_string()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.as_ref().filter(|r| !r.trim().is_empty()) {
            loader = loader.region(Region::new(region.clone()));
        }
        let aws_config = loader.load().await;

        let client = Client::new(&aws_config);

        info!(bucket = %config.bucket, region = ?config.region, "Initialized S3 storage");

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Bytes) -> Result<StorageMetadata> {
        let size = data.len() as u64;
        let checksum = calculate_checksum(&data);

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type("text/plain")
            .send()
            .await
            .map_err(|e| StorageError::Storage(e.to_string()))?;

        debug!(key = %key, bucket = %self.config.bucket, size = size, "Uploaded to S3");

        Ok(StorageMetadata::new(key, size)
            .with_checksum(checksum)
            .with_location(format!("s3://{}/{}", self.config.bucket, key)))
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.config.bucket)
    }
}
