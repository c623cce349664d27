//! Archive storage for rolewatch.
//!
//! Rotated log files can be shipped to object storage after rotation. This
//! crate provides the [`Storage`] trait and two backends:
//!
//! - **Local Storage** - files under a base directory
//! - **S3 Storage** - AWS S3 (behind the `s3` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use rolewatch_storage::*;
//! use std::path::Path;
//!
//! # async fn example() -> Result<()> {
//! let storage = LocalStorage::new("./archive").await?;
//!
//! let key = object_key("audit-logs", "audit-1-20240305_000000.log");
//! let metadata = storage
//!     .put_file(Path::new("logs/audit-1-20240305_000000.log"), &key)
//!     .await?;
//! println!("Archived: {}", metadata.key);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod local;
pub mod storage;

#[cfg(feature = "s3")]
pub mod s3;

pub use error::{Result, StorageError};
pub use local::LocalStorage;
pub use storage::*;

#[cfg(feature = "s3")]
pub use s3::{S3Config, S3Storage};
