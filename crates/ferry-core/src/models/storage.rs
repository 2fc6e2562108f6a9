//! Backend location model: where a record's bytes live on its current backend.
//!
//! The catalog stores this as mutually exclusive sub-documents (`AmazonS3`,
//! `GoogleStorage`). Inside ferry it is a single tagged value so only one can
//! ever be populated; the catalog layer maps it to and from the document form.

use crate::storage_types::StoreKind;

/// Kind-specific location of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendLocation {
    AmazonS3 { path: String },
    GoogleStorage { path: String },
    /// No kind-specific sub-document (filesystem, GridFS, or never placed).
    Unplaced,
}

impl BackendLocation {
    pub const AMAZON_S3_FIELD: &'static str = "AmazonS3";
    pub const GOOGLE_STORAGE_FIELD: &'static str = "GoogleStorage";

    /// Every document field that holds a kind-specific sub-document.
    pub const FIELDS: [&'static str; 2] = [Self::AMAZON_S3_FIELD, Self::GOOGLE_STORAGE_FIELD];

    /// Location for an object written to a backend of `kind` at `path`.
    pub fn for_kind(kind: StoreKind, path: impl Into<String>) -> Self {
        match kind {
            StoreKind::AmazonS3 => BackendLocation::AmazonS3 { path: path.into() },
            StoreKind::GoogleCloudStorage => BackendLocation::GoogleStorage { path: path.into() },
            StoreKind::FileSystem | StoreKind::GridFs => BackendLocation::Unplaced,
        }
    }

    /// Document field this location serialises into, if any.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            BackendLocation::AmazonS3 { .. } => Some(Self::AMAZON_S3_FIELD),
            BackendLocation::GoogleStorage { .. } => Some(Self::GOOGLE_STORAGE_FIELD),
            BackendLocation::Unplaced => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            BackendLocation::AmazonS3 { path } | BackendLocation::GoogleStorage { path } => {
                Some(path)
            }
            BackendLocation::Unplaced => None,
        }
    }

    /// Sub-document fields that must be removed when this location is written.
    pub fn obsolete_fields(&self) -> Vec<&'static str> {
        let own = self.field_name();
        Self::FIELDS
            .iter()
            .copied()
            .filter(|field| Some(*field) != own)
            .collect()
    }
}

/// Fields rewritten on a record after its object was pushed to a new backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// New backend descriptor, `"{kind}:{category}"`.
    pub store: String,
    pub url: String,
    pub path: String,
    pub location: BackendLocation,
}

impl RecordUpdate {
    pub fn obsolete_fields(&self) -> Vec<&'static str> {
        self.location.obsolete_fields()
    }
}
