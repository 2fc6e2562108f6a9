//! Configuration module
//!
//! Settings read from the process environment (and `.env` via dotenvy):
//! catalog connection, per-role storage backend settings and the concurrency
//! limit. Run-level choices (category, offset, delay, ...) come from the CLI.

use std::env;

use crate::storage_types::StoreKind;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONCURRENCY: usize = 1;

/// Environment variable holding the transfer concurrency limit.
pub const MAX_CONCURRENCY_VAR: &str = "MAX_CONCURRENCY";

/// Catalog database connection settings
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        })
    }
}

/// Settings for one storage role (source or destination).
///
/// Values are read from variables prefixed with the role name, e.g.
/// `SOURCE_S3_BUCKET` or `DESTINATION_FS_PATH`.
#[derive(Clone, Debug)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub gcs_bucket: Option<String>,
    pub gcs_service_account_path: Option<String>,
    pub fs_path: Option<String>,
}

impl StoreSettings {
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            gcs_bucket: None,
            gcs_service_account_path: None,
            fs_path: None,
        }
    }

    pub fn from_env(prefix: &str, kind: StoreKind) -> Self {
        dotenvy::dotenv().ok();

        let var = |name: &str| {
            env::var(format!("{}_{}", prefix, name))
                .ok()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            kind,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: var("S3_ENDPOINT"),
            gcs_bucket: var("GCS_BUCKET"),
            gcs_service_account_path: var("GCS_SERVICE_ACCOUNT_PATH"),
            fs_path: var("FS_PATH"),
        }
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn gcs_bucket(&self) -> Option<&str> {
        self.gcs_bucket.as_deref()
    }

    pub fn gcs_service_account_path(&self) -> Option<&str> {
        self.gcs_service_account_path.as_deref()
    }

    pub fn fs_path(&self) -> Option<&str> {
        self.fs_path.as_deref()
    }
}

/// Read the concurrency limit from `MAX_CONCURRENCY`.
pub fn concurrency_from_env() -> Result<usize, anyhow::Error> {
    parse_concurrency(env::var(MAX_CONCURRENCY_VAR).ok().as_deref())
}

/// Unset means the default of 1; anything that is not a positive integer is rejected.
pub fn parse_concurrency(value: Option<&str>) -> Result<usize, anyhow::Error> {
    let Some(value) = value else {
        return Ok(DEFAULT_CONCURRENCY);
    };

    let limit: usize = value.trim().parse().map_err(|_| {
        anyhow::anyhow!(
            "{} must be a positive integer, got {:?}",
            MAX_CONCURRENCY_VAR,
            value
        )
    })?;

    if limit == 0 {
        return Err(anyhow::anyhow!(
            "{} must be at least 1",
            MAX_CONCURRENCY_VAR
        ));
    }

    Ok(limit)
}
