use crate::staging::{already_staged, validate_record_id, write_staged};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StoreKind;
use async_trait::async_trait;
use ferry_core::FileRecord;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects are stored flat under `base_path`, one file per record id.
#[derive(Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Create a new FileSystemStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one file per record (e.g. "/var/lib/uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(FileSystemStorage { base_path })
    }

    /// Convert an object key (always a record id on this backend) to its path.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_record_id(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for FileSystemStorage {
    fn kind(&self) -> StoreKind {
        StoreKind::FileSystem
    }

    async fn fetch(
        &self,
        _collection: &str,
        record: &FileRecord,
        staging_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let path = self.key_to_path(&record.id)?;
        if let Some(staged) = already_staged(staging_dir, &record.id).await? {
            return Ok(staged);
        }

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let chunks = tokio_util::io::ReaderStream::new(file).map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        let staged = write_staged(staging_dir, &record.id, chunks).await?;

        tracing::debug!(
            path = %path.display(),
            staged = %staged.display(),
            "Filesystem fetch successful"
        );

        Ok(staged)
    }

    async fn push(
        &self,
        dest_path: &str,
        local_path: &Path,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(dest_path)?;
        let part_path = self.base_path.join(format!("{}.part", dest_path));
        let start = std::time::Instant::now();

        let size = fs::copy(local_path, &part_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                part_path.display(),
                e
            ))
        })?;

        fs::rename(&part_path, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to move file into {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Filesystem push successful"
        );

        Ok(())
    }

    async fn delete(&self, record: &FileRecord, permanent: bool) -> StorageResult<()> {
        if !permanent {
            return Err(StorageError::NotImplemented(
                "FileSystem does not support soft deletion".to_string(),
            ));
        }

        let path = self.key_to_path(&record.id)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Filesystem delete successful");

        Ok(())
    }
}
