//! Per-run configuration.

use chrono::{DateTime, Utc};
use ferry_core::{Category, StoreKind};
use ferry_storage::Storage;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::MigrationError;

/// What a run does, derived from which storage roles are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fetch from the source, push to the destination, rewrite the record.
    Transfer,
    /// Fetch from the source into the staging directory only.
    DownloadAll,
    /// Push previously staged files to the destination and rewrite the record.
    UploadAll,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Transfer => "transfer",
            Mode::DownloadAll => "download-all",
            Mode::UploadAll => "upload-all",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a single invocation is bound to.
///
/// Built once by the caller and never mutated by the engine.
#[derive(Clone)]
pub struct RunConfig {
    pub category: Category,
    pub source: Option<Arc<dyn Storage>>,
    pub destination: Option<Arc<dyn Storage>>,
    /// Inclusive lower bound on the records' upload time.
    pub offset: Option<DateTime<Utc>>,
    /// Pause after each successful record, taken while the worker still holds its permit.
    pub file_delay: Duration,
    pub concurrency: usize,
    pub skip_errors: bool,
    /// Root of the staging area; files land in `{staging_root}/{category lowercase}/`.
    pub staging_root: PathBuf,
    /// Backend the staged files were downloaded from. Only consulted in upload-all mode.
    pub origin: Option<StoreKind>,
}

impl RunConfig {
    pub fn new(category: Category, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            category,
            source: None,
            destination: None,
            offset: None,
            file_delay: Duration::ZERO,
            concurrency: 1,
            skip_errors: false,
            staging_root: staging_root.into(),
            origin: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn Storage>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_destination(mut self, destination: Arc<dyn Storage>) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_offset(mut self, offset: Option<DateTime<Utc>>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_file_delay(mut self, delay: Duration) -> Self {
        self.file_delay = delay;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_skip_errors(mut self, skip_errors: bool) -> Self {
        self.skip_errors = skip_errors;
        self
    }

    pub fn with_origin(mut self, origin: Option<StoreKind>) -> Self {
        self.origin = origin;
        self
    }

    /// Directory this run stages files in.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_root.join(self.category.lowercase())
    }

    /// Check the bindings and limits, returning the mode they select.
    pub fn validate(&self) -> Result<Mode, MigrationError> {
        if self.concurrency == 0 {
            return Err(MigrationError::Config(
                "Concurrency limit must be at least 1".to_string(),
            ));
        }

        match (&self.source, &self.destination) {
            (Some(_), Some(_)) => Ok(Mode::Transfer),
            (Some(_), None) => Ok(Mode::DownloadAll),
            (None, Some(_)) => Ok(Mode::UploadAll),
            (None, None) => Err(MigrationError::Config(
                "At least one of source or destination storage must be set".to_string(),
            )),
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("category", &self.category)
            .field("source", &self.source.as_ref().map(|s| s.kind()))
            .field("destination", &self.destination.as_ref().map(|s| s.kind()))
            .field("offset", &self.offset)
            .field("file_delay", &self.file_delay)
            .field("concurrency", &self.concurrency)
            .field("skip_errors", &self.skip_errors)
            .field("staging_root", &self.staging_root)
            .field("origin", &self.origin)
            .finish()
    }
}
