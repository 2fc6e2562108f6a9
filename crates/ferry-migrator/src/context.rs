use ferry_core::Category;
use ferry_db::FileCatalog;
use ferry_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Mode;

/// State shared read-only by every worker of one run.
pub struct RunContext {
    pub mode: Mode,
    pub category: Category,
    /// Installation namespace prefixed to object keys.
    pub namespace: String,
    pub source: Option<Arc<dyn Storage>>,
    pub destination: Option<Arc<dyn Storage>>,
    pub catalog: Arc<dyn FileCatalog>,
    pub staging_dir: PathBuf,
    pub skip_errors: bool,
    pub file_delay: Duration,
    /// Number of candidates, for progress logs.
    pub total: usize,
}
