//! PostgreSQL catalog: JSONB documents, one table per collection.

use async_trait::async_trait;
use ferry_core::{CatalogConfig, Category, FileRecord, RecordUpdate};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::time::Duration;

use crate::catalog::{CandidateQuery, CatalogError, FileCatalog};
use crate::document::{update_fields, FileDocument};

/// Table holding installation settings.
const SETTINGS_TABLE: &str = "rocketchat_settings";

/// Setting whose value namespaces every object key.
const NAMESPACE_SETTING: &str = "uniqueID";

/// Catalog backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgFileCatalog {
    pool: PgPool,
}

impl PgFileCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool using the catalog settings
    pub async fn connect(config: &CatalogConfig) -> Result<Self, CatalogError> {
        tracing::info!("Connecting to catalog database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.database_url)
            .await?;

        tracing::info!(
            max_connections = config.db_max_connections,
            "Catalog database connected successfully"
        );

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl FileCatalog for PgFileCatalog {
    #[tracing::instrument(skip(self), fields(db.table = SETTINGS_TABLE))]
    async fn read_namespace(&self) -> Result<String, CatalogError> {
        let value: Option<Option<String>> = sqlx::query_scalar::<Postgres, Option<String>>(
            &format!("SELECT doc->>'value' FROM {} WHERE id = $1", SETTINGS_TABLE),
        )
        .bind(NAMESPACE_SETTING)
        .fetch_optional(&self.pool)
        .await?;

        value
            .flatten()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CatalogError::SettingMissing(NAMESPACE_SETTING.to_string()))
    }

    #[tracing::instrument(
        skip(self, query),
        fields(
            db.table = query.category.collection(),
            store = ?query.store,
            offset = ?query.offset
        )
    )]
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<FileRecord>, CatalogError> {
        let sql = format!(
            r#"
            SELECT id, doc FROM {}
            WHERE ($1::text IS NULL OR doc->>'store' = $1)
              AND ($2::timestamptz IS NULL OR (doc->>'uploadedAt')::timestamptz >= $2)
            ORDER BY (doc->>'uploadedAt')::timestamptz NULLS FIRST, id
            "#,
            query.category.collection()
        );

        let rows = sqlx::query_as::<Postgres, (String, Json<Value>)>(&sql)
            .bind(&query.store)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .map(|(id, Json(doc))| {
                let mut document: FileDocument = serde_json::from_value(doc)
                    .map_err(|source| CatalogError::Decode {
                        id: id.clone(),
                        source,
                    })?;
                document.id = id;
                Ok(document.into_record())
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        tracing::debug!(count = records.len(), "Candidate records loaded");
        Ok(records)
    }

    #[tracing::instrument(
        skip(self, update),
        fields(db.table = category.collection(), db.record_id = %record_id)
    )]
    async fn apply_update(
        &self,
        category: Category,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), CatalogError> {
        let (set, unset) = update_fields(update);

        // Merge and key removal happen in one statement so the record is never
        // observed with two location sub-documents.
        let sql = format!(
            "UPDATE {} SET doc = (doc || $2::jsonb) - $3::text[] WHERE id = $1",
            category.collection()
        );

        let result = sqlx::query::<Postgres>(&sql)
            .bind(record_id)
            .bind(Json(set))
            .bind(&unset)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::RecordNotFound(record_id.to_string()));
        }

        Ok(())
    }
}
