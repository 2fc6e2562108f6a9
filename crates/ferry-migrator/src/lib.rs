//! Migration engine
//!
//! Moves the objects behind catalog file records from a source storage to a
//! destination storage and rewrites each record's location once its object has
//! landed. Transfers run concurrently, bounded by a permit pool; a fatal
//! failure stops admission of new records and is returned to the caller.
//!
//! The operating mode follows from which storage roles are bound:
//!
//! - source and destination: full transfer
//! - source only: download everything into the staging directory
//! - destination only: upload previously staged files

pub mod config;
pub mod context;
pub mod error;
pub mod migrator;
pub mod outcome;
pub mod policy;

pub use config::{Mode, RunConfig};
pub use context::RunContext;
pub use error::{MigrationError, Step};
pub use migrator::Migrator;
pub use outcome::{RunSummary, SkipReason, TransferOutcome};
