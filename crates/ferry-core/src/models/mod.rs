//! Domain models
//!
//! - `file`: catalog file records and the category they belong to
//! - `storage`: backend-specific location of a record and the update written
//!   back to the catalog after a transfer

pub mod file;
pub mod storage;

pub use file::{Category, FileRecord};
pub use storage::{BackendLocation, RecordUpdate};
