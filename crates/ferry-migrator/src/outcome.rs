use std::fmt;

use crate::config::Mode;

/// Why a record was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The upload never completed.
    Incomplete,
    /// The object is absent on the source.
    NotFound,
    /// A storage failure tolerated because errors are being skipped.
    Tolerated(String),
    /// Upload-all found no staged file for the record.
    NotStaged,
    /// The catalog record was deleted before it could be repointed.
    RecordGone,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Incomplete => write!(f, "upload incomplete"),
            SkipReason::NotFound => write!(f, "object not found"),
            SkipReason::Tolerated(error) => write!(f, "error skipped: {}", error),
            SkipReason::NotStaged => write!(f, "no staged file"),
            SkipReason::RecordGone => write!(f, "record deleted during migration"),
        }
    }
}

/// Result of one record that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Migrated,
    Skipped(SkipReason),
}

/// Totals reported at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: Mode,
    pub candidates: usize,
    /// Records fully processed. For download-all this counts staged files.
    pub migrated: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn new(mode: Mode, candidates: usize) -> Self {
        Self {
            mode,
            candidates,
            migrated: 0,
            skipped: 0,
        }
    }

    pub fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Migrated => self.migrated += 1,
            TransferOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}
