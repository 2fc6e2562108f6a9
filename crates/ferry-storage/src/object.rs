//! Object store backed storage (Amazon S3 and Google Cloud Storage).
//!
//! Both clouds go through the same `object_store` engine; only the builder
//! and the catalog sub-document holding the object key differ.

use crate::staging::{already_staged, write_staged};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StoreKind;
use async_trait::async_trait;
use ferry_core::{BackendLocation, FileRecord};
use futures::StreamExt;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, AttributeValue, Attributes, DynObjectStore, ObjectStoreExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Storage over any `object_store` backend
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<DynObjectStore>,
    kind: StoreKind,
    bucket: String,
}

impl ObjectStorage {
    pub fn new(store: Arc<DynObjectStore>, kind: StoreKind, bucket: impl Into<String>) -> Self {
        Self {
            store,
            kind,
            bucket: bucket.into(),
        }
    }

    /// Build an S3 (or S3-compatible) storage
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL (e.g. "http://localhost:9000" for MinIO)
    #[cfg(feature = "storage-s3")]
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), StoreKind::AmazonS3, bucket))
    }

    /// Build a Google Cloud Storage storage
    ///
    /// Credentials come from `service_account_path` when given, otherwise from
    /// the usual `GOOGLE_*` environment variables.
    #[cfg(feature = "storage-gcs")]
    pub fn gcs(bucket: String, service_account_path: Option<String>) -> StorageResult<Self> {
        use object_store::gcp::GoogleCloudStorageBuilder;

        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket.clone());

        if let Some(path) = service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(
            Arc::new(store),
            StoreKind::GoogleCloudStorage,
            bucket,
        ))
    }

    /// Object key the record currently lives at on this backend.
    fn source_key<'a>(&self, record: &'a FileRecord) -> StorageResult<&'a str> {
        match (self.kind, &record.location) {
            (StoreKind::AmazonS3, BackendLocation::AmazonS3 { path })
            | (StoreKind::GoogleCloudStorage, BackendLocation::GoogleStorage { path })
                if !path.is_empty() =>
            {
                Ok(path.as_str())
            }
            _ => Err(StorageError::NotFound(format!(
                "record {} has no {} location",
                record.id, self.kind
            ))),
        }
    }
}

fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Object key {:?} is not allowed",
            key
        )));
    }
    Ok(())
}

#[async_trait]
impl Storage for ObjectStorage {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn fetch(
        &self,
        _collection: &str,
        record: &FileRecord,
        staging_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let key = self.source_key(record)?;
        if let Some(staged) = already_staged(staging_dir, &record.id).await? {
            return Ok(staged);
        }

        let location = ObjectPath::from(key.to_string());
        let start = std::time::Instant::now();

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    backend = %self.kind,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object fetch failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let chunks = result
            .into_stream()
            .map(|chunk| chunk.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        let staged = write_staged(staging_dir, &record.id, chunks).await?;

        tracing::debug!(
            backend = %self.kind,
            bucket = %self.bucket,
            key = %key,
            staged = %staged.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object fetch successful"
        );

        Ok(staged)
    }

    async fn push(
        &self,
        dest_path: &str,
        local_path: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_key(dest_path)?;
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to open staged file {}: {}",
                local_path.display(),
                e
            ))
        })?;

        let mut attributes = Attributes::new();
        if !content_type.is_empty() {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }

        let mut writer = BufWriter::new(self.store.clone(), ObjectPath::from(dest_path.to_string()))
            .with_attributes(attributes);

        let copied = match tokio::io::copy(&mut file, &mut writer).await {
            Ok(copied) => copied,
            Err(e) => {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        writer.shutdown().await.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.kind,
                bucket = %self.bucket,
                key = %dest_path,
                size_bytes = copied,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object push failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::debug!(
            backend = %self.kind,
            bucket = %self.bucket,
            key = %dest_path,
            size_bytes = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object push successful"
        );

        Ok(())
    }

    async fn delete(&self, record: &FileRecord, permanent: bool) -> StorageResult<()> {
        if !permanent {
            return Err(StorageError::NotImplemented(format!(
                "{} does not support soft deletion",
                self.kind
            )));
        }

        let key = self.source_key(record)?;
        let location = ObjectPath::from(key.to_string());

        self.store.delete(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.kind,
                bucket = %self.bucket,
                key = %key,
                "Object delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(backend = %self.kind, bucket = %self.bucket, key = %key, "Object deleted");
        Ok(())
    }
}
