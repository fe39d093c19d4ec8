//! Great-circle distance computation.
//!
//! Distances use the Haversine formula over a spherical Earth. Each
//! [`DistanceUnit`] carries its own mean Earth radius, so converting between
//! units never goes through an intermediate kilometer value.
//!
//! # Example
//!
//! ```
//! use zipdist::distance::{format_distance, haversine_distance, DistanceUnit};
//!
//! // Anchorage (99509) to Saint Paul Island (99660)
//! let km = haversine_distance(61.2181, -149.9003, 57.1842, -170.2764, DistanceUnit::Kilometers);
//! assert_eq!(format_distance(km, DistanceUnit::Kilometers), 1237.48);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownUnitError;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;
/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
/// Mean Earth radius in feet.
pub const EARTH_RADIUS_FEET: f64 = 20_902_231.0;

/// Unit in which distances are computed and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceUnit {
    /// Kilometers, reported with 2 decimal places.
    #[default]
    Kilometers,
    /// Statute miles, reported with 2 decimal places.
    Miles,
    /// Meters, reported as whole numbers.
    Meters,
    /// Feet, reported as whole numbers.
    Feet,
}

impl DistanceUnit {
    /// All supported units, in wire-name order.
    pub const ALL: [DistanceUnit; 4] = [
        DistanceUnit::Kilometers,
        DistanceUnit::Miles,
        DistanceUnit::Meters,
        DistanceUnit::Feet,
    ];

    /// Mean Earth radius expressed in this unit.
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Meters => EARTH_RADIUS_METERS,
            DistanceUnit::Feet => EARTH_RADIUS_FEET,
        }
    }

    /// Number of decimal places kept when a distance is formatted.
    pub fn decimal_places(self) -> i32 {
        match self {
            DistanceUnit::Kilometers | DistanceUnit::Miles => 2,
            DistanceUnit::Meters | DistanceUnit::Feet => 0,
        }
    }

    /// Wire name of the unit (`km`, `miles`, `meters`, `feet`).
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Meters => "meters",
            DistanceUnit::Feet => "feet",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = UnknownUnitError;

    /// Parse a unit name, case-insensitively.
    ///
    /// Accepts the wire names plus `kilometers`, `mi`, `m` and `ft`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
            "miles" | "mi" => Ok(DistanceUnit::Miles),
            "meters" | "m" => Ok(DistanceUnit::Meters),
            "feet" | "ft" => Ok(DistanceUnit::Feet),
            _ => Err(UnknownUnitError {
                unit: s.to_string(),
            }),
        }
    }
}

/// Great-circle distance between two coordinates using the Haversine formula.
///
/// # Arguments
///
/// * `lat1`, `lon1` - First point in decimal degrees
/// * `lat2`, `lon2` - Second point in decimal degrees
/// * `unit` - Unit of the returned distance
///
/// Identical points always yield exactly `0.0`. Out-of-range coordinates are
/// not rejected; the result is simply not meaningful.
///
/// # Examples
///
/// ```
/// use zipdist::distance::{haversine_distance, DistanceUnit};
///
/// let d = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060, DistanceUnit::Miles);
/// assert_eq!(d, 0.0);
/// ```
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: DistanceUnit) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] near antipodes.
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    unit.earth_radius() * c
}

/// Round a raw distance to the precision used for `unit`.
///
/// Kilometers and miles keep 2 decimal places, meters and feet are rounded to
/// whole units. Halves round away from zero.
///
/// # Examples
///
/// ```
/// use zipdist::distance::{format_distance, DistanceUnit};
///
/// assert_eq!(format_distance(123.456789, DistanceUnit::Kilometers), 123.46);
/// assert_eq!(format_distance(123.456789, DistanceUnit::Meters), 123.0);
/// ```
pub fn format_distance(distance: f64, unit: DistanceUnit) -> f64 {
    let factor = 10f64.powi(unit.decimal_places());
    (distance * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    // New York and Los Angeles
    const NYC: (f64, f64) = (40.7128, -74.0060);
    const LA: (f64, f64) = (34.0522, -118.2437);

    fn nyc_to_la(unit: DistanceUnit) -> f64 {
        haversine_distance(NYC.0, NYC.1, LA.0, LA.1, unit)
    }

    #[test]
    fn test_kilometers() {
        let d = nyc_to_la(DistanceUnit::Kilometers);
        assert!(d > 3900.0 && d < 4000.0, "got {d}");
    }

    #[test]
    fn test_miles() {
        let d = nyc_to_la(DistanceUnit::Miles);
        assert!(d > 2400.0 && d < 2500.0, "got {d}");
    }

    #[test]
    fn test_meters() {
        let d = nyc_to_la(DistanceUnit::Meters);
        assert!(d > 3_900_000.0 && d < 4_000_000.0, "got {d}");
    }

    #[test]
    fn test_feet() {
        let d = nyc_to_la(DistanceUnit::Feet);
        assert!(d > 12_800_000.0 && d < 13_200_000.0, "got {d}");
    }

    #[test]
    fn test_default_unit_is_kilometers() {
        assert_eq!(DistanceUnit::default(), DistanceUnit::Kilometers);
        assert_eq!(
            nyc_to_la(DistanceUnit::default()),
            nyc_to_la(DistanceUnit::Kilometers)
        );
    }

    #[test]
    fn test_same_point_is_zero_for_every_unit() {
        for unit in DistanceUnit::ALL {
            assert_eq!(haversine_distance(NYC.0, NYC.1, NYC.0, NYC.1, unit), 0.0);
            assert_eq!(haversine_distance(-90.0, 0.0, -90.0, 0.0, unit), 0.0);
        }
    }

    #[test]
    fn test_pole_to_pole() {
        let d = haversine_distance(90.0, 0.0, -90.0, 0.0, DistanceUnit::Kilometers);
        assert!(d > 19_000.0 && d < 21_000.0, "got {d}");
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_antipodes_are_finite() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0, DistanceUnit::Kilometers);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let d = haversine_distance(45.0, 10.0, -45.0, -170.0, DistanceUnit::Feet);
        assert!(d.is_finite());
    }

    #[test]
    fn test_symmetry() {
        for unit in DistanceUnit::ALL {
            let ab = haversine_distance(NYC.0, NYC.1, LA.0, LA.1, unit);
            let ba = haversine_distance(LA.0, LA.1, NYC.0, NYC.1, unit);
            assert!((ab - ba).abs() < 1e-9, "{unit}: {ab} vs {ba}");
        }
    }

    #[test]
    fn test_unit_ratio_follows_radii() {
        let km = nyc_to_la(DistanceUnit::Kilometers);
        let miles = nyc_to_la(DistanceUnit::Miles);
        let meters = nyc_to_la(DistanceUnit::Meters);

        assert!((miles - km * (EARTH_RADIUS_MILES / EARTH_RADIUS_KM)).abs() < 1e-9);
        assert!((meters - km * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_format_distance() {
        let d = 123.456789;
        assert_eq!(format_distance(d, DistanceUnit::Kilometers), 123.46);
        assert_eq!(format_distance(d, DistanceUnit::Miles), 123.46);
        assert_eq!(format_distance(d, DistanceUnit::Meters), 123.0);
        assert_eq!(format_distance(d, DistanceUnit::Feet), 123.0);
        assert_eq!(format_distance(0.0, DistanceUnit::Kilometers), 0.0);
    }

    #[test]
    fn test_format_distance_rounds_half_away_from_zero() {
        assert_eq!(format_distance(2.5, DistanceUnit::Meters), 3.0);
        assert_eq!(format_distance(1_237_477.5, DistanceUnit::Feet), 1_237_478.0);
        assert_eq!(format_distance(0.125, DistanceUnit::Kilometers), 0.13);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("km".parse::<DistanceUnit>(), Ok(DistanceUnit::Kilometers));
        assert_eq!("MILES".parse::<DistanceUnit>(), Ok(DistanceUnit::Miles));
        assert_eq!("meters".parse::<DistanceUnit>(), Ok(DistanceUnit::Meters));
        assert_eq!(" ft ".parse::<DistanceUnit>(), Ok(DistanceUnit::Feet));
        assert_eq!(
            "leagues".parse::<DistanceUnit>(),
            Err(UnknownUnitError {
                unit: "leagues".to_string()
            })
        );
    }

    #[test]
    fn test_unit_wire_names_round_trip() {
        for unit in DistanceUnit::ALL {
            assert_eq!(unit.to_string().parse::<DistanceUnit>(), Ok(unit));
        }
    }
}
