use anyhow::{Context, Result};
use std::path::PathBuf;
use zipdist::sqlite::SqliteStore;

use super::StoreOptions;

pub async fn run(options: &StoreOptions, dataset: PathBuf) -> Result<()> {
    let database = options
        .database
        .as_ref()
        .context("No database given. Use --database or set ZIPDIST_DATABASE")?;

    let store = SqliteStore::create(database)
        .await
        .with_context(|| format!("Failed to open database {}", database.display()))?;

    let stats = store
        .import_dataset(&dataset)
        .await
        .with_context(|| format!("Failed to import {}", dataset.display()))?;

    println!("Imported:    {}", stats.records_loaded);
    println!("Skipped:     {}", stats.records_skipped);
    println!("Total rows:  {}", store.count().await?);
    println!("Elapsed:     {} ms", stats.elapsed_ms);
    println!("Database:    {}", database.display());

    Ok(())
}
