//! Postal code locations.

use crate::distance::{haversine_distance, DistanceUnit};

/// A point on the Earth's surface in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within their ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipdist::Coordinate;
    ///
    /// assert!(Coordinate::new(61.2181, -149.9003).is_valid());
    /// assert!(!Coordinate::new(91.0, 0.0).is_valid());
    /// assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in the given unit.
    pub fn distance_to(&self, other: &Coordinate, unit: DistanceUnit) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
            unit,
        )
    }
}

/// A postal code resolved to a named place and its coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Postal code, e.g. `"99509"`.
    pub postal_code: String,
    /// Human-readable place name, e.g. `"Anchorage"`.
    pub place_name: String,
    /// Centroid of the postal code area.
    pub coordinate: Coordinate,
    /// State name (GeoNames `admin name1`).
    pub state: Option<String>,
    /// State abbreviation (GeoNames `admin code1`).
    pub state_code: Option<String>,
    /// County name (GeoNames `admin name2`).
    pub county: Option<String>,
}

impl Location {
    /// Create a location without administrative details.
    pub fn new(
        postal_code: impl Into<String>,
        place_name: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            postal_code: postal_code.into(),
            place_name: place_name.into(),
            coordinate,
            state: None,
            state_code: None,
            county: None,
        }
    }

    /// Attach state name and abbreviation.
    pub fn with_state(mut self, state: impl Into<String>, state_code: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self.state_code = Some(state_code.into());
        self
    }

    /// Attach county name.
    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }
}
