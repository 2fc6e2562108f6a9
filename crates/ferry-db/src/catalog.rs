use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferry_core::{Category, FileRecord, RecordUpdate, StoreKind};
use thiserror::Error;

/// Catalog operation errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Setting not found: {0}")]
    SettingMissing(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Malformed document {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which records of a category a run should consider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub category: Category,
    /// Exact `store` descriptor to match; `None` selects the whole category.
    pub store: Option<String>,
    /// Inclusive lower bound on `uploadedAt`.
    pub offset: Option<DateTime<Utc>>,
}

impl CandidateQuery {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            store: None,
            offset: None,
        }
    }

    /// Only records currently held by `kind` (descriptor `"{kind}:{category}"`).
    pub fn held_by(mut self, kind: StoreKind) -> Self {
        self.store = Some(format!("{}:{}", kind, self.category));
        self
    }

    pub fn uploaded_since(mut self, offset: Option<DateTime<Utc>>) -> Self {
        self.offset = offset;
        self
    }
}

/// Catalog accessor consumed by the migration engine.
///
/// One instance is shared by every worker of a run; implementations must be
/// safe for concurrent use. Updates to different records never interfere.
#[async_trait]
pub trait FileCatalog: Send + Sync {
    /// Installation-unique identifier used as the object key prefix.
    async fn read_namespace(&self) -> Result<String, CatalogError>;

    /// Records matching `query`, ordered by upload time then id.
    /// An empty vec means nothing matched.
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<FileRecord>, CatalogError>;

    /// Atomically write `update` to one record, removing obsolete location fields.
    async fn apply_update(
        &self,
        category: Category,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), CatalogError>;
}
