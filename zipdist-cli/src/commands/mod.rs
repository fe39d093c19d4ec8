pub mod batch;
pub mod distance;
pub mod import;
pub mod lookup;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use zipdist::{SharedStore, StoreBuilder};

/// Backend selection shared by every subcommand.
pub struct StoreOptions {
    pub dataset: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub cache_size: u64,
}

impl StoreOptions {
    /// Open the configured store. A database wins over a dataset.
    pub async fn build(&self) -> Result<SharedStore> {
        let mut builder = StoreBuilder::new().cache_size(self.cache_size);

        if let Some(dataset) = &self.dataset {
            builder = builder.dataset(dataset);
        }
        if let Some(database) = &self.database {
            builder = builder.database(database);
        }

        if !builder.is_configured() {
            bail!("No postal code data configured. Use --dataset or --database, or set ZIPDIST_DATASET or ZIPDIST_DATABASE");
        }

        builder
            .build()
            .await
            .context("Failed to open postal code store")
    }
}

/// Render a rounded distance with the unit's precision.
pub fn display_distance(distance: f64, unit: zipdist::DistanceUnit) -> String {
    format!("{:.*}", unit.decimal_places().max(0) as usize, distance)
}
