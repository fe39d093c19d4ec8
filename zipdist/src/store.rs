//! Postal code lookup stores.
//!
//! A [`LocationStore`] resolves postal codes to [`Location`]s. The resolver
//! only ever talks to this trait, so the backing storage can be swapped
//! without touching distance logic:
//!
//! - [`MemoryStore`]: the whole dataset in a `HashMap`, loaded at startup
//! - [`SqliteStore`](crate::sqlite::SqliteStore): a SQLite table filled by
//!   the bulk loader (requires the `sqlite` feature)
//! - [`CachedStore`]: an LRU cache in front of either of them
//!
//! [`StoreBuilder`] wires these together from configuration.
//!
//! ```ignore
//! use zipdist::StoreBuilder;
//!
//! let store = StoreBuilder::new()
//!     .dataset("data/zipcodes.csv")
//!     .cache_size(5_000)
//!     .build()
//!     .await?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CachedStore;
use crate::dataset::{load_locations, LoadStats};
use crate::error::StoreError;
use crate::location::Location;

#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteStore;

/// Default number of locations kept in the lookup cache.
pub const DEFAULT_CACHE_SIZE: u64 = 10_000;

/// Read access to postal code locations.
///
/// Implementations must answer each call with a single round-trip to their
/// backing storage.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Find the location for one postal code.
    async fn find_one(&self, code: &str) -> Result<Option<Location>, StoreError>;

    /// Find the locations for a batch of postal codes.
    ///
    /// Codes that don't exist are simply absent from the result, which may
    /// therefore be shorter than `codes`. No ordering is guaranteed.
    async fn find_many(&self, codes: &[String]) -> Result<Vec<Location>, StoreError>;
}

#[async_trait]
impl<S: LocationStore + ?Sized> LocationStore for Arc<S> {
    async fn find_one(&self, code: &str) -> Result<Option<Location>, StoreError> {
        (**self).find_one(code).await
    }

    async fn find_many(&self, codes: &[String]) -> Result<Vec<Location>, StoreError> {
        (**self).find_many(codes).await
    }
}

/// A store holding every location in memory.
///
/// When a dataset lists the same postal code more than once, the first
/// record wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    locations: HashMap<String, Location>,
}

impl MemoryStore {
    /// Create a store from an iterator of locations.
    pub fn from_locations<I: IntoIterator<Item = Location>>(locations: I) -> Self {
        let mut map = HashMap::new();
        for location in locations {
            map.entry(location.postal_code.clone()).or_insert(location);
        }
        Self { locations: map }
    }

    /// Load a store from a GeoNames dataset file.
    ///
    /// See [`crate::dataset`] for supported formats.
    pub fn from_dataset<P: AsRef<Path>>(path: P) -> Result<(Self, LoadStats), StoreError> {
        let (locations, stats) = load_locations(path)?;
        Ok((Self::from_locations(locations), stats))
    }

    /// Look up a location without going through the async trait.
    pub fn get(&self, code: &str) -> Option<&Location> {
        self.locations.get(code)
    }

    /// Number of distinct postal codes.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the store holds no locations.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn find_one(&self, code: &str) -> Result<Option<Location>, StoreError> {
        Ok(self.locations.get(code).cloned())
    }

    async fn find_many(&self, codes: &[String]) -> Result<Vec<Location>, StoreError> {
        Ok(codes
            .iter()
            .filter_map(|code| self.locations.get(code).cloned())
            .collect())
    }
}

/// The store type used by the service and CLI: any backend behind a cache.
pub type SharedStore = CachedStore<Arc<dyn LocationStore>>;

/// Builder for a [`SharedStore`].
///
/// A configured database takes precedence over a dataset file.
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    dataset: Option<PathBuf>,
    #[cfg(feature = "sqlite")]
    database: Option<PathBuf>,
    cache_size: u64,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBuilder {
    /// Create a builder with no backend configured.
    pub fn new() -> Self {
        Self {
            dataset: None,
            #[cfg(feature = "sqlite")]
            database: None,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ZIPDIST_DATASET` | GeoNames CSV/TSV dataset to load into memory | None |
    /// | `ZIPDIST_DATABASE` | SQLite database created by the bulk loader* | None |
    /// | `ZIPDIST_CACHE_SIZE` | Maximum locations in cache | 10000 |
    ///
    /// *Only used when the `sqlite` feature is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConfigured`] if no backend variable is set.
    pub fn from_env() -> Result<Self, StoreError> {
        let mut builder = Self::new();

        if let Ok(dataset) = std::env::var("ZIPDIST_DATASET") {
            builder = builder.dataset(dataset);
        }

        #[cfg(feature = "sqlite")]
        {
            if let Ok(database) = std::env::var("ZIPDIST_DATABASE") {
                builder = builder.database(database);
            }
        }

        if let Some(size) = std::env::var("ZIPDIST_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            builder = builder.cache_size(size);
        }

        if !builder.is_configured() {
            return Err(StoreError::NotConfigured);
        }

        Ok(builder)
    }

    /// Use a dataset file loaded into memory.
    pub fn dataset<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dataset = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a SQLite database created by the bulk loader.
    #[cfg(feature = "sqlite")]
    pub fn database<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the maximum number of cached locations.
    ///
    /// Default is 10000.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Whether a backend has been configured.
    pub fn is_configured(&self) -> bool {
        #[cfg(feature = "sqlite")]
        {
            if self.database.is_some() {
                return true;
            }
        }
        self.dataset.is_some()
    }

    /// Build the [`SharedStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if no backend is configured, the dataset cannot be
    /// loaded, or the database cannot be opened.
    pub async fn build(self) -> Result<SharedStore, StoreError> {
        #[cfg(feature = "sqlite")]
        {
            if let Some(path) = self.database {
                let store = SqliteStore::open(&path).await?;
                tracing::info!(database = %path.display(), "Opened SQLite lookup store");
                let inner: Arc<dyn LocationStore> = Arc::new(store);
                return Ok(CachedStore::new(inner, self.cache_size));
            }
        }

        let path = self.dataset.ok_or(StoreError::NotConfigured)?;
        let (store, stats) = MemoryStore::from_dataset(&path)?;
        tracing::info!(
            dataset = %path.display(),
            postal_codes = store.len(),
            records_loaded = stats.records_loaded,
            records_skipped = stats.records_skipped,
            elapsed_ms = stats.elapsed_ms,
            "Loaded postal code dataset"
        );

        let inner: Arc<dyn LocationStore> = Arc::new(store);
        Ok(CachedStore::new(inner, self.cache_size))
    }
}
