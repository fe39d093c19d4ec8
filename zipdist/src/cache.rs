//! LRU caching in front of a lookup store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;

use crate::error::StoreError;
use crate::location::Location;
use crate::store::LocationStore;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of locations currently in the cache.
    pub entry_count: u64,
    /// Number of postal codes served from cache.
    pub hit_count: u64,
    /// Number of postal codes forwarded to the inner store.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// A [`LocationStore`] that caches successful lookups of an inner store.
///
/// Only found locations are cached; unknown codes are asked for again on
/// every request. Batch lookups serve what they can from cache and forward
/// all remaining codes to the inner store in a single call.
///
/// # Example
///
/// ```ignore
/// use zipdist::{CachedStore, MemoryStore};
///
/// let store = CachedStore::new(MemoryStore::from_dataset("zipcodes.csv")?.0, 1_000);
/// let anchorage = store.find_one("99509").await?;
/// println!("Cache hit rate: {:.1}%", store.cache_stats().hit_rate() * 100.0);
/// ```
pub struct CachedStore<S> {
    inner: S,
    /// LRU cache of resolved locations, keyed by postal code.
    cache: Cache<String, Arc<Location>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl<S> CachedStore<S> {
    /// Wrap `inner` with a cache holding at most `capacity` locations.
    pub fn new(inner: S, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        // moka applies inserts lazily; flush them so the count is current.
        self.cache.run_pending_tasks();
        CacheStats {
            entry_count: self.cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.cache.policy().max_capacity().unwrap_or(0)
    }

    /// Remove one postal code from the cache.
    pub fn invalidate(&self, code: &str) {
        self.cache.invalidate(code);
    }

    /// Clear all locations from the cache.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    fn cached(&self, code: &str) -> Option<Location> {
        match self.cache.get(code) {
            Some(location) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Some(Location::clone(&location))
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn remember(&self, location: &Location) {
        self.cache
            .insert(location.postal_code.clone(), Arc::new(location.clone()));
    }
}

#[async_trait]
impl<S: LocationStore> LocationStore for CachedStore<S> {
    async fn find_one(&self, code: &str) -> Result<Option<Location>, StoreError> {
        if let Some(location) = self.cached(code) {
            return Ok(Some(location));
        }

        let found = self.inner.find_one(code).await?;
        if let Some(location) = &found {
            self.remember(location);
        }
        Ok(found)
    }

    async fn find_many(&self, codes: &[String]) -> Result<Vec<Location>, StoreError> {
        let mut found = Vec::with_capacity(codes.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for code in codes {
            if !seen.insert(code.as_str()) {
                continue;
            }
            match self.cached(code) {
                Some(location) => found.push(location),
                None => missing.push(code.clone()),
            }
        }

        if !missing.is_empty() {
            // Rows arrive in storage order; only the first row for a code is cached.
            let mut remembered = HashSet::new();
            for location in self.inner.find_many(&missing).await? {
                if remembered.insert(location.postal_code.clone()) {
                    self.remember(&location);
                }
                found.push(location);
            }
        }

        Ok(found)
    }
}
