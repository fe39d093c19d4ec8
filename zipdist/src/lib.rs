//! # zipdist - Postal Code Distance Library
//!
//! Great-circle distances between US postal codes, computed from a local
//! GeoNames dataset.
//!
//! ## Features
//!
//! - **Haversine**: straight-line distance over a spherical Earth in
//!   kilometers, miles, meters or feet
//! - **Batch resolution**: one origin against many destinations with a single
//!   batched lookup, sorted nearest-first
//! - **Partial results**: unknown destination codes are reported, not fatal
//! - **Pluggable storage**: in-memory dataset or SQLite (`sqlite` feature),
//!   with an LRU cache in front
//!
//! ## Quick Start
//!
//! ```ignore
//! use zipdist::{DistanceRequest, DistanceResolver, DistanceUnit, StoreBuilder};
//!
//! let store = StoreBuilder::new().dataset("data/zipcodes.csv").build().await?;
//! let resolver = DistanceResolver::new(store);
//!
//! let request = DistanceRequest::new("99509", vec!["99660".into()], DistanceUnit::Kilometers)?;
//! let response = resolver.resolve(&request).await?;
//! println!("{} km", response.destinations[0].distance);
//! ```
//!
//! ## Distance Calculation
//!
//! ```
//! use zipdist::distance::{format_distance, haversine_distance, DistanceUnit};
//!
//! let raw = haversine_distance(61.2181, -149.9003, 57.1842, -170.2764, DistanceUnit::Meters);
//! assert_eq!(format_distance(raw, DistanceUnit::Meters), 1_237_478.0);
//! ```
//!
//! ## Data Sources
//!
//! Download US postal code data from:
//! - <https://download.geonames.org/export/zip/>

pub mod cache;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod location;
pub mod resolver;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export main types at crate root for convenience
pub use cache::{CacheStats, CachedStore};
pub use dataset::LoadStats;
pub use distance::DistanceUnit;
pub use error::{ResolveError, Result, StoreError, UnknownUnitError, ValidationError};
pub use location::{Coordinate, Location};
pub use resolver::{DistanceRequest, DistanceResolver, DistanceResponse, DistanceResult};
pub use store::{LocationStore, MemoryStore, SharedStore, StoreBuilder};
