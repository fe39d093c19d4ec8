//! Distance request resolution.
//!
//! [`DistanceResolver`] turns one origin postal code and a list of
//! destination codes into distances sorted nearest-first. It performs two
//! reads against its [`LocationStore`] per request (one for the origin, one
//! batch for every destination) and issues them concurrently.
//!
//! # Example
//!
//! ```ignore
//! use zipdist::{DistanceRequest, DistanceResolver, DistanceUnit, MemoryStore};
//!
//! let (store, _) = MemoryStore::from_dataset("data/zipcodes.csv")?;
//! let resolver = DistanceResolver::new(store);
//!
//! let request = DistanceRequest::new(
//!     "99509",
//!     vec!["99660".to_string(), "99547".to_string()],
//!     DistanceUnit::Miles,
//! )?;
//! let response = resolver.resolve(&request).await?;
//! for result in &response.destinations {
//!     println!("{} {} {}", result.location.postal_code, result.distance, result.unit);
//! }
//! ```

use std::collections::HashMap;

use crate::distance::{format_distance, DistanceUnit};
use crate::error::{ResolveError, Result, ValidationError};
use crate::location::Location;
use crate::store::LocationStore;

/// A validated distance request.
///
/// Construction enforces every precondition, so a `DistanceRequest` can
/// always be resolved without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceRequest {
    origin: String,
    destinations: Vec<String>,
    unit: DistanceUnit,
    unit_name: String,
}

impl DistanceRequest {
    /// Create a request from an origin code and destination codes.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingOrigin`] if `origin` is empty
    /// - [`ValidationError::EmptyDestinations`] if `destinations` is empty
    pub fn new(
        origin: impl Into<String>,
        destinations: Vec<String>,
        unit: DistanceUnit,
    ) -> std::result::Result<Self, ValidationError> {
        let origin = origin.into();
        if origin.is_empty() {
            return Err(ValidationError::MissingOrigin);
        }
        if destinations.is_empty() {
            return Err(ValidationError::EmptyDestinations);
        }

        Ok(Self {
            origin,
            destinations,
            unit,
            unit_name: unit.as_str().to_string(),
        })
    }

    /// Create a request from optional parts, as received from a caller.
    ///
    /// Checks run in order: origin, destination presence, then destination
    /// emptiness. A missing unit means kilometers. A unit name that matches
    /// no [`DistanceUnit`] is computed with the kilometer radius and
    /// precision, and is still echoed back as given.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipdist::{DistanceRequest, DistanceUnit, ValidationError};
    ///
    /// let request = DistanceRequest::from_parts(
    ///     Some("99509".to_string()),
    ///     Some(vec!["99660".to_string()]),
    ///     Some("miles"),
    /// ).unwrap();
    /// assert_eq!(request.unit(), DistanceUnit::Miles);
    ///
    /// let request = DistanceRequest::from_parts(
    ///     Some("99509".to_string()),
    ///     Some(vec!["99660".to_string()]),
    ///     Some("yards"),
    /// ).unwrap();
    /// assert_eq!(request.unit(), DistanceUnit::Kilometers);
    /// assert_eq!(request.unit_name(), "yards");
    ///
    /// let err = DistanceRequest::from_parts(Some("99509".to_string()), None, None).unwrap_err();
    /// assert_eq!(err, ValidationError::MissingDestinations);
    /// ```
    pub fn from_parts(
        origin: Option<String>,
        destinations: Option<Vec<String>>,
        unit: Option<&str>,
    ) -> std::result::Result<Self, ValidationError> {
        let origin = origin.ok_or(ValidationError::MissingOrigin)?;
        if origin.is_empty() {
            return Err(ValidationError::MissingOrigin);
        }
        let destinations = destinations.ok_or(ValidationError::MissingDestinations)?;
        if destinations.is_empty() {
            return Err(ValidationError::EmptyDestinations);
        }

        let Some(name) = unit else {
            return Self::new(origin, destinations, DistanceUnit::default());
        };
        match name.parse::<DistanceUnit>() {
            Ok(unit) => Self::new(origin, destinations, unit),
            Err(_) => {
                tracing::debug!(unit = name, "Unrecognized unit, using kilometers");
                let mut request = Self::new(origin, destinations, DistanceUnit::Kilometers)?;
                request.unit_name = name.to_string();
                Ok(request)
            }
        }
    }

    /// Origin postal code.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Destination postal codes, in request order.
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    /// Unit whose radius and precision are used for the distances.
    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// Unit name reported with each result.
    ///
    /// The wire name of [`unit`](Self::unit), or the caller's own string
    /// when it matched no known unit.
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }
}

/// Distance from the origin to one resolved destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceResult {
    /// The destination.
    pub location: Location,
    /// Distance from the origin, already rounded for the request's unit.
    pub distance: f64,
    /// Unit name as reported to the caller, see [`DistanceRequest::unit_name`].
    pub unit: String,
}

/// Outcome of a resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceResponse {
    /// The resolved origin.
    pub origin: Location,
    /// Resolved destinations, nearest first.
    pub destinations: Vec<DistanceResult>,
    /// Destination codes that could not be resolved, in request order.
    pub not_found: Vec<String>,
}

/// Resolves distance requests against a [`LocationStore`].
pub struct DistanceResolver<S> {
    store: S,
}

impl<S: LocationStore> DistanceResolver<S> {
    /// Create a resolver that reads locations from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute distances from the request's origin to each destination.
    ///
    /// Destinations are sorted ascending by rounded distance; ties keep
    /// request order. Unknown destination codes don't fail the request and
    /// are reported in [`DistanceResponse::not_found`] instead.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::OriginNotFound`] if the origin code is unknown
    /// - [`ResolveError::Internal`] if the store fails
    pub async fn resolve(&self, request: &DistanceRequest) -> Result<DistanceResponse> {
        tracing::debug!(
            origin = %request.origin,
            destinations = request.destinations.len(),
            unit = %request.unit_name,
            "Resolving distance request"
        );

        let (origin, destinations) = futures::join!(
            self.store.find_one(&request.origin),
            self.store.find_many(&request.destinations),
        );

        let origin = origin
            .map_err(|e| log_store_failure(&request.origin, e))?
            .ok_or_else(|| ResolveError::OriginNotFound {
                code: request.origin.clone(),
            })?;
        let destinations = destinations.map_err(|e| log_store_failure(&request.origin, e))?;

        let mut by_code: HashMap<&str, &Location> = HashMap::with_capacity(destinations.len());
        for location in &destinations {
            by_code
                .entry(location.postal_code.as_str())
                .or_insert(location);
        }

        let unit = request.unit;
        let mut results = Vec::with_capacity(request.destinations.len());
        let mut not_found = Vec::new();

        for code in &request.destinations {
            match by_code.get(code.as_str()) {
                Some(&location) => {
                    let raw = origin.coordinate.distance_to(&location.coordinate, unit);
                    results.push(DistanceResult {
                        location: location.clone(),
                        distance: format_distance(raw, unit),
                        unit: request.unit_name.clone(),
                    });
                }
                None => not_found.push(code.clone()),
            }
        }

        // Stable, so equal distances keep request order.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        if !not_found.is_empty() {
            tracing::warn!(
                origin = %request.origin,
                not_found = ?not_found,
                "Destination postal codes not found"
            );
        }

        Ok(DistanceResponse {
            origin,
            destinations: results,
            not_found,
        })
    }

    /// Look up a single postal code.
    pub async fn lookup(&self, code: &str) -> Result<Option<Location>> {
        self.store
            .find_one(code)
            .await
            .map_err(|e| log_store_failure(code, e))
    }
}

fn log_store_failure(code: &str, e: crate::error::StoreError) -> ResolveError {
    tracing::error!(code = code, error = %e, "Lookup store failed");
    ResolveError::Internal(e)
}
