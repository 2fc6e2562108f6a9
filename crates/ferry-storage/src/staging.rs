//! Local staging of fetched objects.
//!
//! Each worker owns exactly one staged file, keyed by record id, so concurrent
//! fetches never write the same path.

use crate::traits::{StorageError, StorageResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Path a record's object is staged at inside `staging_dir`.
pub fn staged_path(staging_dir: &Path, record_id: &str) -> PathBuf {
    staging_dir.join(record_id)
}

/// Reject ids that would resolve outside the staging directory.
pub fn validate_record_id(record_id: &str) -> StorageResult<()> {
    if record_id.is_empty()
        || record_id.contains("..")
        || record_id.contains('/')
        || record_id.contains('\\')
    {
        return Err(StorageError::InvalidKey(format!(
            "Record id {:?} cannot be used as a file name",
            record_id
        )));
    }
    Ok(())
}

/// The staged file for `record_id` if an earlier run already completed it.
///
/// Providers check this before contacting their backend.
pub(crate) async fn already_staged(
    staging_dir: &Path,
    record_id: &str,
) -> StorageResult<Option<PathBuf>> {
    validate_record_id(record_id)?;

    let path = staged_path(staging_dir, record_id);
    if fs::try_exists(&path).await? {
        tracing::debug!(path = %path.display(), "Reusing already staged file");
        return Ok(Some(path));
    }
    Ok(None)
}

/// Stream `chunks` into the staged file for `record_id` and return its path.
///
/// Local I/O failures surface as `StorageError::IoError`; errors yielded by
/// `chunks` are passed through unchanged.
///
/// Bytes go to `{id}.part` first and are renamed into place once complete, so a
/// crash never leaves a truncated file under the final name. An existing
/// staged file is returned as-is without consuming the stream.
pub(crate) async fn write_staged<S>(
    staging_dir: &Path,
    record_id: &str,
    mut chunks: S,
) -> StorageResult<PathBuf>
where
    S: Stream<Item = Result<Bytes, StorageError>> + Unpin + Send,
{
    if let Some(existing) = already_staged(staging_dir, record_id).await? {
        return Ok(existing);
    }
    let final_path = staged_path(staging_dir, record_id);

    fs::create_dir_all(staging_dir).await?;

    let part_path = staging_dir.join(format!("{}.part", record_id));
    let start = std::time::Instant::now();

    let result = async {
        let mut file = fs::File::create(&part_path).await?;

        let mut size: u64 = 0;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }

        file.sync_all().await?;
        fs::rename(&part_path, &final_path).await?;
        Ok::<u64, StorageError>(size)
    }
    .await;

    match result {
        Ok(size) => {
            tracing::debug!(
                path = %final_path.display(),
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Staged file written"
            );
            Ok(final_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}
