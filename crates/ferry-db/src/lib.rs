//! Catalog access for file records
//!
//! The catalog is a document store: one table per collection holding
//! `(id TEXT PRIMARY KEY, doc JSONB NOT NULL)`. `FileCatalog` is the narrow
//! interface the migration engine consumes; `PgFileCatalog` implements it on
//! PostgreSQL. `document` maps between the stored JSON shape and
//! `ferry_core::FileRecord`.

pub mod catalog;
pub mod document;
pub mod postgres;

pub use catalog::{CandidateQuery, CatalogError, FileCatalog};
pub use document::{FileDocument, LocationDocument};
pub use postgres::PgFileCatalog;
