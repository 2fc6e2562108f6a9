//! ferry: migrate file objects between storage backends.
//!
//! Backend settings come from SOURCE_* / DESTINATION_* variables, the catalog
//! from DATABASE_URL, and the worker limit from MAX_CONCURRENCY.

use anyhow::Context;
use clap::Parser;
use ferry_cli::{format_summary, init_tracing, Cli};
use ferry_core::{concurrency_from_env, CatalogConfig, StoreKind, StoreSettings};
use ferry_db::PgFileCatalog;
use ferry_migrator::{Migrator, RunConfig};
use ferry_storage::{create_storage, Storage};
use std::sync::Arc;
use std::time::Duration;

async fn bind_storage(
    role: &str,
    kind: Option<StoreKind>,
) -> anyhow::Result<Option<Arc<dyn Storage>>> {
    let Some(kind) = kind else {
        return Ok(None);
    };

    let settings = StoreSettings::from_env(role, kind);
    let storage = create_storage(&settings).await.with_context(|| {
        format!("Failed to initialize {} storage ({})", role.to_lowercase(), kind)
    })?;
    Ok(Some(storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let concurrency = concurrency_from_env()?;

    let mut config = RunConfig::new(cli.category, cli.staging_root())
        .with_offset(cli.offset)
        .with_file_delay(Duration::from_millis(cli.delay_ms))
        .with_concurrency(concurrency)
        .with_skip_errors(cli.skip_errors)
        .with_origin(cli.origin);

    if let Some(source) = bind_storage("SOURCE", cli.source).await? {
        config = config.with_source(source);
    }
    if let Some(destination) = bind_storage("DESTINATION", cli.destination).await? {
        config = config.with_destination(destination);
    }
    config.validate()?;

    let catalog_config = CatalogConfig::from_env()?;
    let catalog = PgFileCatalog::connect(&catalog_config)
        .await
        .context("Failed to connect to catalog database")?;

    let migrator = Migrator::new(Arc::new(catalog));
    match migrator.run(&config).await {
        Ok(summary) => {
            println!("{}", format_summary(&summary));
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!(error = %e, "Nothing to migrate");
            Ok(())
        }
        Err(e) => Err(e).context("Migration failed"),
    }
}
