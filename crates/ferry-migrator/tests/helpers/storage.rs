//! In-memory `Storage` with injectable faults and an in-flight gauge.

use async_trait::async_trait;
use ferry_core::{FileRecord, StoreKind};
use ferry_storage::{Storage, StorageError, StorageResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Failure injected for one record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    NotFound,
    Fail,
    Panic,
}

pub struct FakeStorage {
    kind: StoreKind,
    latency: Mutex<Duration>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pushed: Mutex<BTreeMap<String, Vec<u8>>>,
    fetch_faults: Mutex<HashMap<String, Fault>>,
    push_faults: Mutex<HashMap<String, Fault>>,
    fetched: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Counts one in-flight call; released on drop, including unwinding.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeStorage {
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            latency: Mutex::new(Duration::ZERO),
            objects: Mutex::new(HashMap::new()),
            pushed: Mutex::new(BTreeMap::new()),
            fetch_faults: Mutex::new(HashMap::new()),
            push_faults: Mutex::new(HashMap::new()),
            fetched: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn kind_value(&self) -> StoreKind {
        self.kind
    }

    /// Time every fetch and push takes. Injected faults fire before the wait.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn put_object(&self, record_id: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(record_id.to_string(), bytes.to_vec());
    }

    pub fn fail_fetch(&self, record_id: &str, fault: Fault) {
        self.fetch_faults
            .lock()
            .unwrap()
            .insert(record_id.to_string(), fault);
    }

    /// Fault a push whose staged file belongs to `record_id`.
    pub fn fail_push(&self, record_id: &str, fault: Fault) {
        self.push_faults
            .lock()
            .unwrap()
            .insert(record_id.to_string(), fault);
    }

    pub fn pushed(&self) -> BTreeMap<String, Vec<u8>> {
        self.pushed.lock().unwrap().clone()
    }

    /// Record ids in the order their fetch started.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.active)
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn injected(faults: &Mutex<HashMap<String, Fault>>, record_id: &str) -> StorageResult<()> {
        let fault = faults.lock().unwrap().get(record_id).copied();
        match fault {
            None => Ok(()),
            Some(Fault::NotFound) => Err(StorageError::NotFound(record_id.to_string())),
            Some(Fault::Fail) => Err(StorageError::BackendError(format!(
                "injected failure for {}",
                record_id
            ))),
            Some(Fault::Panic) => panic!("injected panic for {}", record_id),
        }
    }
}

#[async_trait]
impl Storage for FakeStorage {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn fetch(
        &self,
        _collection: &str,
        record: &FileRecord,
        staging_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let _in_flight = self.enter();
        self.fetched.lock().unwrap().push(record.id.clone());
        Self::injected(&self.fetch_faults, &record.id)?;
        self.wait().await;

        let bytes = self
            .objects
            .lock()
            .unwrap()
            .get(&record.id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(record.id.clone()))?;

        let path = staging_dir.join(&record.id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    async fn push(
        &self,
        dest_path: &str,
        local_path: &Path,
        _content_type: &str,
    ) -> StorageResult<()> {
        let _in_flight = self.enter();

        let record_id = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        Self::injected(&self.push_faults, &record_id)?;
        self.wait().await;

        let bytes = tokio::fs::read(local_path).await?;
        self.pushed
            .lock()
            .unwrap()
            .insert(dest_path.to_string(), bytes);
        Ok(())
    }
}
