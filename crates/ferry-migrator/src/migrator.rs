//! Run orchestration: candidate selection and the bounded worker pool.

use ferry_core::{FileRecord, StoreKind};
use ferry_db::{CandidateQuery, CatalogError, FileCatalog};
use ferry_storage::{staged_path, validate_record_id, Storage, StorageError};
use futures::FutureExt;
use std::any::Any;
use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::{Mode, RunConfig};
use crate::context::RunContext;
use crate::error::{MigrationError, Step};
use crate::outcome::{RunSummary, SkipReason, TransferOutcome};
use crate::policy;

type WorkerResult = Result<TransferOutcome, MigrationError>;

/// Drives migration runs against one catalog.
#[derive(Clone)]
pub struct Migrator {
    catalog: Arc<dyn FileCatalog>,
}

impl Migrator {
    pub fn new(catalog: Arc<dyn FileCatalog>) -> Self {
        Self { catalog }
    }

    /// Run one migration as described by `config`.
    ///
    /// Returns the run totals, `MigrationError::NoCandidates` when nothing
    /// matched, or the first fatal error a worker hit. After a fatal error no
    /// further record is started; workers already running are allowed to finish.
    pub async fn run(&self, config: &RunConfig) -> Result<RunSummary, MigrationError> {
        let mode = config.validate()?;
        let started = Instant::now();

        tracing::info!(
            mode = %mode,
            category = %config.category,
            source = ?config.source.as_ref().map(|s| s.kind()),
            destination = ?config.destination.as_ref().map(|s| s.kind()),
            offset = ?config.offset,
            concurrency = config.concurrency,
            skip_errors = config.skip_errors,
            "Starting migration"
        );

        let namespace = self.catalog.read_namespace().await?;
        tracing::debug!(namespace = %namespace, "Resolved instance namespace");

        let query = candidate_query(config, mode);
        let records = self.catalog.find_candidates(&query).await?;
        if records.is_empty() {
            return Err(MigrationError::NoCandidates {
                collection: config.category.collection(),
                store: query.store.unwrap_or_else(|| "any".to_string()),
            });
        }

        tracing::info!(count = records.len(), "Found files to migrate");

        let staging_dir = config.staging_dir();
        if let Some(source) = &config.source {
            source
                .prepare_staging_area(&staging_dir)
                .await
                .map_err(|source| MigrationError::Staging {
                    path: staging_dir.clone(),
                    source,
                })?;
        }

        let ctx = Arc::new(RunContext {
            mode,
            category: config.category,
            namespace,
            source: config.source.clone(),
            destination: config.destination.clone(),
            catalog: Arc::clone(&self.catalog),
            staging_dir,
            skip_errors: config.skip_errors,
            file_delay: config.file_delay,
            total: records.len(),
        });

        let summary = execute(ctx, records, config.concurrency).await?;

        tracing::info!(
            mode = %summary.mode,
            candidates = summary.candidates,
            migrated = summary.migrated,
            skipped = summary.skipped,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Migration finished"
        );

        Ok(summary)
    }
}

/// Records a run selects: those held by the source kind, or in upload-all
/// mode by the origin kind if one was given.
fn candidate_query(config: &RunConfig, mode: Mode) -> CandidateQuery {
    let holder = match mode {
        Mode::UploadAll => config.origin,
        Mode::Transfer | Mode::DownloadAll => config.source.as_ref().map(|s| s.kind()),
    };

    let query = CandidateQuery::new(config.category).uploaded_since(config.offset);
    match holder {
        Some(kind) => query.held_by(kind),
        None => query,
    }
}

/// Feed `records` through at most `limit` concurrent workers.
async fn execute(
    ctx: Arc<RunContext>,
    records: Vec<FileRecord>,
    limit: usize,
) -> Result<RunSummary, MigrationError> {
    let semaphore = Arc::new(Semaphore::new(limit));
    let abort = CancellationToken::new();
    let mut workers: JoinSet<WorkerResult> = JoinSet::new();
    let mut summary = RunSummary::new(ctx.mode, records.len());
    let mut first_error: Option<MigrationError> = None;

    for (position, record) in records.into_iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = abort.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        // A worker may have failed while we were waiting on the permit.
        if abort.is_cancelled() {
            break;
        }

        while let Some(joined) = workers.try_join_next() {
            absorb(joined, &mut summary, &mut first_error, &abort);
        }
        if abort.is_cancelled() {
            break;
        }

        let ctx = Arc::clone(&ctx);
        let abort = abort.clone();
        let index = position + 1;

        workers.spawn(async move {
            let result = AssertUnwindSafe(process_record(&ctx, index, &record))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(MigrationError::Worker(format!(
                        "record {} panicked: {}",
                        record.id,
                        panic_message(panic.as_ref())
                    )))
                });

            // Cancel before the permit is released so the scheduler never
            // admits another record after a fatal error.
            if result.is_err() {
                abort.cancel();
            }
            drop(permit);
            result
        });
    }

    while let Some(joined) = workers.join_next().await {
        absorb(joined, &mut summary, &mut first_error, &abort);
    }

    match first_error {
        Some(error) => {
            tracing::error!(
                error = %error,
                migrated = summary.migrated,
                skipped = summary.skipped,
                "Migration aborted"
            );
            Err(error)
        }
        None => Ok(summary),
    }
}

fn absorb(
    joined: Result<WorkerResult, JoinError>,
    summary: &mut RunSummary,
    first_error: &mut Option<MigrationError>,
    abort: &CancellationToken,
) {
    let result = joined.unwrap_or_else(|e| Err(MigrationError::Worker(e.to_string())));
    match result {
        Ok(outcome) => summary.record(&outcome),
        Err(error) => {
            abort.cancel();
            if first_error.is_none() {
                *first_error = Some(error);
            } else {
                tracing::error!(error = %error, "Further failure after abort");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn process_record(ctx: &RunContext, index: usize, record: &FileRecord) -> WorkerResult {
    if !record.complete {
        tracing::debug!(
            index,
            total = ctx.total,
            record_id = %record.id,
            "Skipping incomplete upload"
        );
        return Ok(TransferOutcome::Skipped(SkipReason::Incomplete));
    }

    let outcome = match ctx.mode {
        Mode::Transfer => transfer(ctx, index, record).await?,
        Mode::DownloadAll => download(ctx, index, record).await?,
        Mode::UploadAll => upload(ctx, index, record).await?,
    };

    if outcome == TransferOutcome::Migrated && !ctx.file_delay.is_zero() {
        tokio::time::sleep(ctx.file_delay).await;
    }

    Ok(outcome)
}

async fn transfer(ctx: &RunContext, index: usize, record: &FileRecord) -> WorkerResult {
    let source = bound(ctx.source.as_ref(), "source")?;
    let destination = bound(ctx.destination.as_ref(), "destination")?;

    let staged = match fetch(ctx, index, source, record).await? {
        ControlFlow::Continue(path) => path,
        ControlFlow::Break(outcome) => return Ok(outcome),
    };

    push_and_update(ctx, index, destination, record, staged).await
}

async fn download(ctx: &RunContext, index: usize, record: &FileRecord) -> WorkerResult {
    let source = bound(ctx.source.as_ref(), "source")?;

    match fetch(ctx, index, source, record).await? {
        ControlFlow::Continue(_) => Ok(TransferOutcome::Migrated),
        ControlFlow::Break(outcome) => Ok(outcome),
    }
}

async fn upload(ctx: &RunContext, index: usize, record: &FileRecord) -> WorkerResult {
    let destination = bound(ctx.destination.as_ref(), "destination")?;

    if let Err(e) = validate_record_id(&record.id) {
        return tolerate(ctx, record, Step::Push, e);
    }

    let staged = staged_path(&ctx.staging_dir, &record.id);
    let exists = tokio::fs::try_exists(&staged)
        .await
        .map_err(|e| MigrationError::Staging {
            path: staged.clone(),
            source: StorageError::IoError(e),
        })?;

    if !exists {
        tracing::warn!(
            index,
            total = ctx.total,
            record_id = %record.id,
            path = %staged.display(),
            "No staged file, skipping"
        );
        return Ok(TransferOutcome::Skipped(SkipReason::NotStaged));
    }

    push_and_update(ctx, index, destination, record, staged).await
}

/// Stage the record's object locally. `Break` carries a skip outcome.
async fn fetch(
    ctx: &RunContext,
    index: usize,
    source: &dyn Storage,
    record: &FileRecord,
) -> Result<ControlFlow<TransferOutcome, PathBuf>, MigrationError> {
    tracing::debug!(
        index,
        total = ctx.total,
        record_id = %record.id,
        name = %record.name,
        source = %source.kind(),
        "Downloading file"
    );

    match source
        .fetch(ctx.category.collection(), record, &ctx.staging_dir)
        .await
    {
        Ok(path) => {
            tracing::debug!(
                index,
                total = ctx.total,
                record_id = %record.id,
                path = %path.display(),
                "Downloaded file"
            );
            Ok(ControlFlow::Continue(path))
        }
        Err(e) => tolerate(ctx, record, Step::Fetch, e).map(ControlFlow::Break),
    }
}

async fn push_and_update(
    ctx: &RunContext,
    index: usize,
    destination: &dyn Storage,
    record: &FileRecord,
    staged: PathBuf,
) -> WorkerResult {
    let kind = destination.kind();
    let key = policy::object_path(record, ctx.category, kind, &ctx.namespace);

    tracing::debug!(
        index,
        total = ctx.total,
        record_id = %record.id,
        destination = %kind,
        key = %key,
        "Uploading file"
    );

    if let Err(e) = destination
        .push(&key, &staged, &record.content_type)
        .await
    {
        return tolerate(ctx, record, Step::Push, e);
    }

    update_record(ctx, index, kind, record, &key).await
}

async fn update_record(
    ctx: &RunContext,
    index: usize,
    kind: StoreKind,
    record: &FileRecord,
    key: &str,
) -> WorkerResult {
    let update = policy::record_update(record, ctx.category, kind, key);

    tracing::debug!(
        index,
        total = ctx.total,
        record_id = %record.id,
        store = %update.store,
        "Updating catalog record"
    );

    match ctx
        .catalog
        .apply_update(ctx.category, &record.id, &update)
        .await
    {
        Ok(()) => {
            tracing::debug!(index, total = ctx.total, record_id = %record.id, "Record migrated");
            Ok(TransferOutcome::Migrated)
        }
        // Deleted by the application while its object was in flight.
        Err(CatalogError::RecordNotFound(_)) => {
            tracing::warn!(
                index,
                total = ctx.total,
                record_id = %record.id,
                key = %key,
                "Record vanished before update, skipping"
            );
            Ok(TransferOutcome::Skipped(SkipReason::RecordGone))
        }
        Err(source) => Err(MigrationError::Update {
            record_id: record.id.clone(),
            source,
        }),
    }
}

/// Decide whether a storage failure skips the record or aborts the run.
///
/// Local staging I/O always aborts. A missing source object is always skipped.
/// Anything else is skipped only when the run skips errors.
fn tolerate(
    ctx: &RunContext,
    record: &FileRecord,
    step: Step,
    error: StorageError,
) -> WorkerResult {
    if matches!(error, StorageError::IoError(_)) {
        return Err(MigrationError::Staging {
            path: staged_path(&ctx.staging_dir, &record.id),
            source: error,
        });
    }

    if step == Step::Fetch && error.is_not_found() {
        tracing::warn!(record_id = %record.id, error = %error, "Source object not found, skipping");
        return Ok(TransferOutcome::Skipped(SkipReason::NotFound));
    }

    if ctx.skip_errors {
        tracing::warn!(
            record_id = %record.id,
            step = %step,
            error = %error,
            "Skipping record after error"
        );
        return Ok(TransferOutcome::Skipped(SkipReason::Tolerated(error.to_string())));
    }

    Err(MigrationError::Transfer {
        record_id: record.id.clone(),
        step,
        source: error,
    })
}

fn bound<'a>(
    storage: Option<&'a Arc<dyn Storage>>,
    role: &str,
) -> Result<&'a dyn Storage, MigrationError> {
    storage
        .map(|s| &**s)
        .ok_or_else(|| MigrationError::Config(format!("No {} storage bound", role)))
}
