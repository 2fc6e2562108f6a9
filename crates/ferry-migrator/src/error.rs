use ferry_db::CatalogError;
use ferry_storage::StorageError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline step a record failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Push,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Step::Fetch => write!(f, "fetch"),
            Step::Push => write!(f, "push"),
        }
    }
}

/// Errors that end a run.
///
/// Per-record failures that are tolerated never reach this type; they become
/// `TransferOutcome::Skipped` instead.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No files found in {collection} (store filter: {store})")]
    NoCandidates {
        collection: &'static str,
        store: String,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{step} failed for record {record_id}: {source}")]
    Transfer {
        record_id: String,
        step: Step,
        #[source]
        source: StorageError,
    },

    #[error("Failed to update record {record_id}: {source}")]
    Update {
        record_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("Staging error at {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Transfer worker failed: {0}")]
    Worker(String),
}

impl MigrationError {
    /// No record matched the candidate query. Callers may treat this as an
    /// empty, successful run.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrationError::NoCandidates { .. })
    }

    /// The run was rejected before any work started.
    pub fn is_config(&self) -> bool {
        matches!(self, MigrationError::Config(_))
    }
}
