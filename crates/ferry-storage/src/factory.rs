#[cfg(feature = "storage-local")]
use crate::FileSystemStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-gcs"))]
use crate::ObjectStorage;
use crate::{Storage, StorageError, StorageResult, StoreKind};
use ferry_core::StoreSettings;
use std::sync::Arc;

/// Create a storage backend for one role from its settings
pub async fn create_storage(settings: &StoreSettings) -> StorageResult<Arc<dyn Storage>> {
    match settings.kind {
        #[cfg(feature = "storage-s3")]
        StoreKind::AmazonS3 => {
            let bucket = settings
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = settings.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = settings.s3_endpoint().map(String::from);

            let storage = ObjectStorage::s3(bucket, region, endpoint)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StoreKind::AmazonS3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-gcs")]
        StoreKind::GoogleCloudStorage => {
            let bucket = settings.gcs_bucket().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("GCS_BUCKET not configured".to_string())
            })?;
            let service_account = settings.gcs_service_account_path().map(String::from);

            let storage = ObjectStorage::gcs(bucket, service_account)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gcs"))]
        StoreKind::GoogleCloudStorage => Err(StorageError::ConfigError(
            "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StoreKind::FileSystem => {
            let base_path = settings.fs_path().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("FS_PATH not configured".to_string())
            })?;

            let storage = FileSystemStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StoreKind::FileSystem => Err(StorageError::ConfigError(
            "Filesystem storage backend not available (storage-local feature not enabled)"
                .to_string(),
        )),

        StoreKind::GridFs => Err(StorageError::ConfigError(
            "GridFS storage backend is not supported".to_string(),
        )),
    }
}
