//! Destination object keys and the record rewrite applied after a push.

use ferry_core::{BackendLocation, Category, FileRecord, RecordUpdate, StoreKind};

/// Stand-in for an empty owner id inside object keys.
pub const UNDEFINED_SEGMENT: &str = "undefined";

fn segment(value: &str) -> &str {
    if value.is_empty() {
        UNDEFINED_SEGMENT
    } else {
        value
    }
}

/// Key a record's object is written under on the destination.
///
/// Filesystem destinations are keyed by record id alone; object stores get a
/// namespaced key built from the record's owners.
pub fn object_path(
    record: &FileRecord,
    category: Category,
    destination: StoreKind,
    namespace: &str,
) -> String {
    if destination == StoreKind::FileSystem {
        return record.id.clone();
    }

    match category {
        Category::Uploads => format!(
            "{}/uploads/{}/{}/{}",
            namespace,
            segment(record.room_id.as_deref().unwrap_or_default()),
            segment(&record.user_id),
            record.id
        ),
        Category::Avatars => format!("{}/avatars/{}", namespace, segment(&record.user_id)),
    }
}

/// Served path of a record once it lives on `destination`.
pub fn served_path(record: &FileRecord, category: Category, destination: StoreKind) -> String {
    format!(
        "/ufs/{}:{}/{}/{}",
        destination, category, record.id, record.name
    )
}

/// Fields to write on `record` after its object landed at `object_path`.
pub fn record_update(
    record: &FileRecord,
    category: Category,
    destination: StoreKind,
    object_path: &str,
) -> RecordUpdate {
    let served = served_path(record, category, destination);
    RecordUpdate {
        store: format!("{}:{}", destination, category),
        url: served.clone(),
        path: served,
        location: BackendLocation::for_kind(destination, object_path),
    }
}
