//! Storage abstraction trait
//!
//! This module defines the Storage trait that every backend taking part in a
//! migration (as source or destination) must implement.

use crate::StoreKind;
use async_trait::async_trait;
use ferry_core::FileRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl StorageError {
    /// The object does not exist on the backend. Migrations tolerate this per record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage provider trait
///
/// One instance is bound per role (source, destination) and shared by every
/// transfer worker of a run, so implementations must be safe for concurrent use.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend kind, used for routing path and record policy decisions.
    fn kind(&self) -> StoreKind;

    /// Create the staging directory fetched objects are written into.
    async fn prepare_staging_area(&self, dir: &Path) -> StorageResult<()> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                dir.display(),
                e
            ))
        })
    }

    /// Fetch the object behind `record` into `staging_dir` and return the local path.
    ///
    /// `collection` names the catalog collection the record came from; backends
    /// that key objects by collection use it, others ignore it.
    /// Returns `StorageError::NotFound` when the object is absent.
    async fn fetch(
        &self,
        collection: &str,
        record: &FileRecord,
        staging_dir: &Path,
    ) -> StorageResult<PathBuf>;

    /// Upload the local file at `local_path` to `dest_path` on this backend.
    async fn push(&self, dest_path: &str, local_path: &Path, content_type: &str)
        -> StorageResult<()>;

    /// Delete the object behind `record`.
    ///
    /// Not used by migrations. Backends that cannot delete keep this default.
    async fn delete(&self, record: &FileRecord, _permanent: bool) -> StorageResult<()> {
        Err(StorageError::NotImplemented(format!(
            "delete is not supported by the {} backend (record {})",
            self.kind(),
            record.id
        )))
    }
}
