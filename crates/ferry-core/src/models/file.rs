use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::storage::BackendLocation;

/// Category of objects moved by a run. Each category lives in its own catalog
/// collection and uses its own destination key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Uploads,
    Avatars,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Uploads => "Uploads",
            Category::Avatars => "Avatars",
        }
    }

    /// Lowercase form used in object keys and staging directories.
    pub fn lowercase(&self) -> &'static str {
        match self {
            Category::Uploads => "uploads",
            Category::Avatars => "avatars",
        }
    }

    /// Catalog collection holding records of this category.
    pub fn collection(&self) -> &'static str {
        match self {
            Category::Uploads => "rocketchat_uploads",
            Category::Avatars => "rocketchat_avatars",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Only the exact literals are accepted; the category is part of the
    /// catalog's `store` descriptor and is compared verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Uploads" => Ok(Category::Uploads),
            "Avatars" => Ok(Category::Avatars),
            _ => Err(anyhow::anyhow!(
                "Invalid category: {} (expected Uploads or Avatars)",
                s
            )),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One object under migration, as read from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub user_id: String,
    pub room_id: Option<String>,
    /// False while the upload is still in progress; such records are never moved.
    pub complete: bool,
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Current backend descriptor, `"{kind}:{category}"`.
    pub store: String,
    pub location: BackendLocation,
    pub url: Option<String>,
    pub path: Option<String>,
}

impl FileRecord {
    /// Minimal complete record, mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: "application/octet-stream".to_string(),
            user_id: String::new(),
            room_id: None,
            complete: true,
            uploaded_at: None,
            store: String::new(),
            location: BackendLocation::Unplaced,
            url: None,
            path: None,
        }
    }
}
