//! Ferry Core Library
//!
//! This crate provides the domain model and configuration shared by every
//! ferry component: file records, categories, store kinds, backend locations
//! and the record update produced after a successful transfer.

pub mod config;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{concurrency_from_env, CatalogConfig, StoreSettings};
pub use models::{BackendLocation, Category, FileRecord, RecordUpdate};
pub use storage_types::StoreKind;
