//! Error types for the zipdist library.

use std::path::PathBuf;
use thiserror::Error;

/// A distance request that violates its preconditions.
///
/// Validation happens before any lookup is attempted, so these errors never
/// carry store state. Each variant renders as a single message suitable for
/// showing to the caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Origin postal code absent or empty.
    #[error("Invalid parameters. originZipCode is required.")]
    MissingOrigin,

    /// Destination list absent.
    #[error("Invalid parameters. destinationZipCodes is required.")]
    MissingDestinations,

    /// Destination list present but not a list of strings.
    #[error("Invalid parameters. destinationZipCodes must be an array of postal codes.")]
    InvalidDestinations,

    /// Destination list present but empty.
    #[error("The destination postal codes list cannot be empty.")]
    EmptyDestinations,
}

/// A unit name that matches no [`DistanceUnit`](crate::DistanceUnit).
///
/// Only strict parsing reports this. Distance requests fall back to
/// kilometer policy for unrecognized units instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid unit: {unit} (expected one of km, miles, meters, feet)")]
pub struct UnknownUnitError {
    pub unit: String,
}

/// Errors raised by a lookup store or while ingesting a dataset.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error when reading a dataset.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed dataset file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite backend failure.
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Dataset extension is neither `.csv` nor a GeoNames `.txt`/`.tsv` dump.
    #[error("Unsupported dataset format: {path} (expected .csv, .txt or .tsv)")]
    UnsupportedFormat { path: PathBuf },

    /// Neither a dataset nor a database was configured.
    #[error("No lookup store configured (set ZIPDIST_DATASET or ZIPDIST_DATABASE)")]
    NotConfigured,

    /// The store could not serve the request.
    #[error("Lookup store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors that terminate a distance request.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The origin postal code is not in the lookup store.
    #[error("Origin postal code not found: {code}")]
    OriginNotFound { code: String },

    /// Unexpected lookup failure. The detail is for logs, not for callers.
    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),
}

impl ResolveError {
    /// Whether the failure was caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ResolveError::Internal(_))
    }
}

/// Result type alias using [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
