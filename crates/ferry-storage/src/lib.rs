//! Ferry Storage Library
//!
//! This crate provides the storage provider abstraction used on both sides of
//! a migration, plus implementations for Amazon S3, Google Cloud Storage and
//! the plain filesystem.
//!
//! # Staging
//!
//! Fetching an object never hands bytes back in memory: the provider streams
//! it into `{staging_dir}/{record_id}` (via a `.part` file renamed on
//! completion) and returns that path. A file already present at that path is
//! reused, so an interrupted download-all run can be resumed cheaply.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
pub mod object;
pub mod staging;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use ferry_core::StoreKind;
#[cfg(feature = "storage-local")]
pub use local::FileSystemStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
pub use object::ObjectStorage;
pub use staging::{staged_path, validate_record_id};
pub use traits::{Storage, StorageError, StorageResult};
