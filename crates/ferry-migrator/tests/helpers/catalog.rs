//! In-memory `FileCatalog` holding documents in their stored JSON shape.

use async_trait::async_trait;
use ferry_core::{Category, FileRecord, RecordUpdate};
use ferry_db::document::update_fields;
use ferry_db::{CandidateQuery, CatalogError, FileCatalog, FileDocument};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct FakeCatalog {
    namespace: Option<String>,
    collections: Mutex<HashMap<Category, BTreeMap<String, Value>>>,
    queries: Mutex<Vec<CandidateQuery>>,
    failing_updates: Mutex<HashSet<String>>,
    vanishing: Mutex<HashSet<String>>,
    updates: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::without_namespace()
        }
    }

    pub fn without_namespace() -> Self {
        Self {
            namespace: None,
            collections: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            failing_updates: Mutex::new(HashSet::new()),
            vanishing: Mutex::new(HashSet::new()),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, category: Category, record: &FileRecord) {
        let doc = serde_json::to_value(FileDocument::from(record)).unwrap();
        self.insert_document(category, doc);
    }

    pub fn insert_document(&self, category: Category, doc: Value) {
        let id = doc["_id"].as_str().unwrap().to_string();
        self.collections
            .lock()
            .unwrap()
            .entry(category)
            .or_default()
            .insert(id, doc);
    }

    pub fn document(&self, category: Category, id: &str) -> Value {
        self.collections.lock().unwrap()[&category][id].clone()
    }

    pub fn record(&self, category: Category, id: &str) -> FileRecord {
        let doc: FileDocument = serde_json::from_value(self.document(category, id)).unwrap();
        doc.into_record()
    }

    pub fn queries(&self) -> Vec<CandidateQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn fail_update(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    /// Delete the record once its update arrives, as if the application
    /// removed it while the object was being copied.
    pub fn vanish_on_update(&self, id: &str) {
        self.vanishing.lock().unwrap().insert(id.to_string());
    }

    pub fn contains(&self, category: Category, id: &str) -> bool {
        self.collections
            .lock()
            .unwrap()
            .get(&category)
            .is_some_and(|docs| docs.contains_key(id))
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileCatalog for FakeCatalog {
    async fn read_namespace(&self) -> Result<String, CatalogError> {
        self.namespace
            .clone()
            .ok_or_else(|| CatalogError::SettingMissing("uniqueID".to_string()))
    }

    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<FileRecord>, CatalogError> {
        self.queries.lock().unwrap().push(query.clone());

        let collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get(&query.category) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<FileRecord> = docs
            .values()
            .map(|doc| {
                serde_json::from_value::<FileDocument>(doc.clone())
                    .unwrap()
                    .into_record()
            })
            .filter(|record| match &query.store {
                Some(store) => &record.store == store,
                None => true,
            })
            .filter(|record| match query.offset {
                Some(offset) => record.uploaded_at.is_some_and(|at| at >= offset),
                None => true,
            })
            .collect();

        records.sort_by(|a, b| (a.uploaded_at, &a.id).cmp(&(b.uploaded_at, &b.id)));
        Ok(records)
    }

    async fn apply_update(
        &self,
        category: Category,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), CatalogError> {
        if self.failing_updates.lock().unwrap().contains(record_id) {
            return Err(CatalogError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut collections = self.collections.lock().unwrap();
        if self.vanishing.lock().unwrap().contains(record_id) {
            if let Some(docs) = collections.get_mut(&category) {
                docs.remove(record_id);
            }
        }
        let doc = collections
            .get_mut(&category)
            .and_then(|docs| docs.get_mut(record_id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CatalogError::RecordNotFound(record_id.to_string()))?;

        let (set, unset) = update_fields(update);
        if let Value::Object(fields) = set {
            doc.extend(fields);
        }
        for key in unset {
            doc.remove(&key);
        }

        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
