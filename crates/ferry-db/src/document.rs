//! Stored document shape of a file record.
//!
//! Location sub-documents are separate optional fields here; everything above
//! this layer sees the single `BackendLocation` value instead.

use chrono::{DateTime, Utc};
use ferry_core::{BackendLocation, FileRecord, RecordUpdate, StoreKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Treat an explicit `null` like a missing field.
///
/// The surrounding application writes `null` for unset strings and flags;
/// `#[serde(default)]` alone only covers absent keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Kind-specific location sub-document (`AmazonS3` / `GoogleStorage`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(rename = "rid", default)]
    pub room_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub complete: bool,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub store: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "AmazonS3", default, skip_serializing_if = "Option::is_none")]
    pub amazon_s3: Option<LocationDocument>,
    #[serde(rename = "GoogleStorage", default, skip_serializing_if = "Option::is_none")]
    pub google_storage: Option<LocationDocument>,
}

impl FileDocument {
    /// Collapse the sub-documents into a single location.
    ///
    /// If a stale document carries both, the one matching the `store`
    /// descriptor wins.
    fn location(&self) -> BackendLocation {
        let s3 = self
            .amazon_s3
            .as_ref()
            .filter(|doc| !doc.path.is_empty())
            .map(|doc| BackendLocation::AmazonS3 {
                path: doc.path.clone(),
            });
        let gcs = self
            .google_storage
            .as_ref()
            .filter(|doc| !doc.path.is_empty())
            .map(|doc| BackendLocation::GoogleStorage {
                path: doc.path.clone(),
            });

        let declared = self
            .store
            .split(':')
            .next()
            .and_then(|kind| kind.parse::<StoreKind>().ok());

        let preferred = match declared {
            Some(StoreKind::GoogleCloudStorage) => gcs.or(s3),
            _ => s3.or(gcs),
        };

        preferred.unwrap_or(BackendLocation::Unplaced)
    }

    pub fn into_record(self) -> FileRecord {
        let location = self.location();
        FileRecord {
            id: self.id,
            name: self.name,
            content_type: self.content_type,
            user_id: self.user_id,
            room_id: self.room_id,
            complete: self.complete,
            uploaded_at: self.uploaded_at,
            store: self.store,
            location,
            url: self.url,
            path: self.path,
        }
    }
}

impl From<&FileRecord> for FileDocument {
    fn from(record: &FileRecord) -> Self {
        let mut doc = FileDocument {
            id: record.id.clone(),
            name: record.name.clone(),
            content_type: record.content_type.clone(),
            user_id: record.user_id.clone(),
            room_id: record.room_id.clone(),
            complete: record.complete,
            uploaded_at: record.uploaded_at,
            store: record.store.clone(),
            url: record.url.clone(),
            path: record.path.clone(),
            amazon_s3: None,
            google_storage: None,
        };
        match &record.location {
            BackendLocation::AmazonS3 { path } => {
                doc.amazon_s3 = Some(LocationDocument { path: path.clone() })
            }
            BackendLocation::GoogleStorage { path } => {
                doc.google_storage = Some(LocationDocument { path: path.clone() })
            }
            BackendLocation::Unplaced => {}
        }
        doc
    }
}

/// Split an update into the fields to merge into the document and the
/// location fields to remove from it.
pub fn update_fields(update: &RecordUpdate) -> (Value, Vec<String>) {
    let mut set = Map::new();
    set.insert("store".to_string(), Value::String(update.store.clone()));
    set.insert("url".to_string(), Value::String(update.url.clone()));
    set.insert("path".to_string(), Value::String(update.path.clone()));

    if let (Some(field), Some(path)) = (update.location.field_name(), update.location.path()) {
        set.insert(field.to_string(), json!({ "path": path }));
    }

    let unset = update
        .obsolete_fields()
        .into_iter()
        .map(String::from)
        .collect();

    (Value::Object(set), unset)
}
