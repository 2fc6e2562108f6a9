use chrono::{DateTime, Utc};
use clap::Parser;
use ferry_core::{Category, StoreKind};
use ferry_migrator::RunSummary;
use std::path::PathBuf;

/// Move file objects between storage backends and repoint their catalog records.
///
/// Bind both --source and --destination for a full transfer, only --source
/// to download everything into the staging directory, or only --destination
/// to upload previously staged files.
#[derive(Debug, Parser)]
#[command(name = "ferry", version)]
pub struct Cli {
    /// Category to migrate: Uploads or Avatars
    #[arg(long)]
    pub category: Category,

    /// Backend the files currently live on (AmazonS3, GoogleCloudStorage, FileSystem)
    #[arg(long)]
    pub source: Option<StoreKind>,

    /// Backend to move the files to
    #[arg(long)]
    pub destination: Option<StoreKind>,

    /// Only migrate files uploaded at or after this RFC 3339 timestamp
    #[arg(long)]
    pub offset: Option<DateTime<Utc>>,

    /// Pause after each migrated file, in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Skip files that fail to transfer instead of aborting
    #[arg(long)]
    pub skip_errors: bool,

    /// Log every pipeline step
    #[arg(long)]
    pub debug: bool,

    /// Staging directory (defaults to a `ferry` directory under the system temp dir)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Backend the staged files came from, used to select records when uploading
    #[arg(long)]
    pub origin: Option<StoreKind>,
}

impl Cli {
    pub fn staging_root(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ferry"))
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Initialize tracing for the CLI.
pub fn init_tracing(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(debug))),
        )
        .init();
}

pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "{}: {} candidates, {} migrated, {} skipped",
        summary.mode, summary.candidates, summary.migrated, summary.skipped
    )
}
