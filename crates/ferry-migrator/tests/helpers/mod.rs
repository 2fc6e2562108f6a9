//! Test helpers: in-memory catalog and storage fakes plus record fixtures.
//!
//! Run from workspace root: `cargo test -p ferry-migrator`.

#![allow(dead_code)]

pub mod catalog;
pub mod storage;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use ferry_core::{BackendLocation, Category, FileRecord, StoreKind};
use ferry_migrator::{Migrator, RunConfig};
use std::sync::Arc;
use tempfile::TempDir;

pub use catalog::FakeCatalog;
pub use storage::{Fault, FakeStorage};

pub const NAMESPACE: &str = "ns1";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()
}

/// A complete upload held by `kind`, uploaded `minute` minutes after `base_time`.
pub fn upload_record(id: &str, kind: StoreKind, minute: i64) -> FileRecord {
    let mut record = FileRecord::new(id, format!("{}.png", id));
    record.content_type = "image/png".to_string();
    record.user_id = "u1".to_string();
    record.room_id = Some("GENERAL".to_string());
    record.uploaded_at = Some(base_time() + ChronoDuration::minutes(minute));
    record.store = format!("{}:Uploads", kind);
    record.location = BackendLocation::for_kind(kind, format!("old/uploads/{}", id));
    record.url = Some(format!("/ufs/{}:Uploads/{}/{}.png", kind, id, id));
    record.path = record.url.clone();
    record
}

pub fn avatar_record(id: &str, user_id: &str, kind: StoreKind) -> FileRecord {
    let mut record = FileRecord::new(id, "avatar.jpg");
    record.content_type = "image/jpeg".to_string();
    record.user_id = user_id.to_string();
    record.uploaded_at = Some(base_time());
    record.store = format!("{}:Avatars", kind);
    record.location = BackendLocation::for_kind(kind, format!("old/avatars/{}", id));
    record
}

/// Catalog, both storage roles and a staging directory for one test.
pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub source: Arc<FakeStorage>,
    pub destination: Arc<FakeStorage>,
    pub staging: TempDir,
}

impl Harness {
    pub fn new(source: StoreKind, destination: StoreKind) -> Self {
        Self {
            catalog: Arc::new(FakeCatalog::new(NAMESPACE)),
            source: Arc::new(FakeStorage::new(source)),
            destination: Arc::new(FakeStorage::new(destination)),
            staging: TempDir::new().unwrap(),
        }
    }

    /// `count` complete uploads `r01..` held by the source, each with an object.
    pub fn seed_uploads(&self, count: usize) -> Vec<String> {
        (1..=count)
            .map(|n| {
                let id = format!("r{:02}", n);
                let record = upload_record(&id, self.source.kind_value(), n as i64);
                self.catalog.insert(Category::Uploads, &record);
                self.source.put_object(&id, format!("bytes of {}", id).as_bytes());
                id
            })
            .collect()
    }

    pub fn migrator(&self) -> Migrator {
        Migrator::new(self.catalog.clone())
    }

    pub fn transfer(&self, category: Category) -> RunConfig {
        RunConfig::new(category, self.staging.path())
            .with_source(self.source.clone())
            .with_destination(self.destination.clone())
    }

    pub fn download_only(&self, category: Category) -> RunConfig {
        RunConfig::new(category, self.staging.path()).with_source(self.source.clone())
    }

    pub fn upload_only(&self, category: Category) -> RunConfig {
        RunConfig::new(category, self.staging.path()).with_destination(self.destination.clone())
    }
}
