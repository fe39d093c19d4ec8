//! GeoNames postal code dataset ingestion.
//!
//! Two layouts of the GeoNames US postal code data are supported:
//!
//! - **CSV** (`.csv`): comma-separated with a header row using the GeoNames
//!   column names (`country code`, `postal code`, `place name`,
//!   `admin name1`, `admin code1`, `admin name2`, `admin code2`, `latitude`,
//!   `longitude`). Extra columns are ignored.
//! - **GeoNames dump** (`.txt`, `.tsv`): the raw tab-separated `US.txt`
//!   download, no header, 12 columns.
//!
//! Records whose postal code is empty or whose coordinates don't parse or lie
//! outside the valid range are skipped and counted in [`LoadStats`].
//!
//! Data is available from <https://download.geonames.org/export/zip/>.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use serde::Deserialize;

use crate::error::StoreError;
use crate::location::{Coordinate, Location};

// Column positions in the headerless GeoNames dump.
const GEONAMES_POSTAL_CODE: usize = 1;
const GEONAMES_PLACE_NAME: usize = 2;
const GEONAMES_ADMIN_NAME1: usize = 3;
const GEONAMES_ADMIN_CODE1: usize = 4;
const GEONAMES_ADMIN_NAME2: usize = 5;
const GEONAMES_LATITUDE: usize = 9;
const GEONAMES_LONGITUDE: usize = 10;

/// On-disk layout of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Comma-separated with a GeoNames header row.
    Csv,
    /// Headerless tab-separated GeoNames dump.
    GeoNames,
}

impl DatasetFormat {
    /// Detect the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipdist::dataset::DatasetFormat;
    ///
    /// assert_eq!(DatasetFormat::from_path("data/zipcodes.csv").unwrap(), DatasetFormat::Csv);
    /// assert_eq!(DatasetFormat::from_path("US.txt").unwrap(), DatasetFormat::GeoNames);
    /// assert!(DatasetFormat::from_path("zipcodes.json").is_err());
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "txt" | "tsv" => Ok(DatasetFormat::GeoNames),
            _ => Err(StoreError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Statistics from loading a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Number of records turned into locations.
    pub records_loaded: u64,
    /// Number of records skipped for a missing code or bad coordinates.
    pub records_skipped: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "postal code")]
    postal_code: String,
    #[serde(rename = "place name", default)]
    place_name: String,
    #[serde(rename = "admin name1", default)]
    admin_name1: Option<String>,
    #[serde(rename = "admin code1", default)]
    admin_code1: Option<String>,
    #[serde(rename = "admin name2", default)]
    admin_name2: Option<String>,
    latitude: String,
    longitude: String,
}

/// Load every valid location from a dataset file.
///
/// The format is detected from the file extension.
///
/// # Errors
///
/// Returns an error if the extension is not supported, the file cannot be
/// read, or the CSV structure is malformed (e.g. missing `postal code`
/// column). Individual bad records are skipped, not reported as errors.
pub fn load_locations<P: AsRef<Path>>(path: P) -> Result<(Vec<Location>, LoadStats), StoreError> {
    let format = DatasetFormat::from_path(&path)?;
    let file = File::open(path.as_ref())?;
    read_locations(BufReader::new(file), format)
}

/// Read every valid location from `reader`.
pub fn read_locations<R: Read>(
    reader: R,
    format: DatasetFormat,
) -> Result<(Vec<Location>, LoadStats), StoreError> {
    let start = Instant::now();
    let mut stats = LoadStats::default();
    let mut locations = Vec::new();

    let mut push = |location: Option<Location>| match location {
        Some(location) => {
            stats.records_loaded += 1;
            locations.push(location);
        }
        None => stats.records_skipped += 1,
    };

    match format {
        DatasetFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader);

            for record in reader.deserialize::<CsvRecord>() {
                let record = record?;
                push(build_location(
                    record.postal_code,
                    record.place_name,
                    record.admin_name1,
                    record.admin_code1,
                    record.admin_name2,
                    &record.latitude,
                    &record.longitude,
                ));
            }
        }
        DatasetFormat::GeoNames => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .flexible(true)
                .quoting(false)
                .trim(csv::Trim::All)
                .from_reader(reader);

            for record in reader.records() {
                let record = record?;
                let field = |i: usize| record.get(i).unwrap_or("").to_string();
                push(build_location(
                    field(GEONAMES_POSTAL_CODE),
                    field(GEONAMES_PLACE_NAME),
                    Some(field(GEONAMES_ADMIN_NAME1)),
                    Some(field(GEONAMES_ADMIN_CODE1)),
                    Some(field(GEONAMES_ADMIN_NAME2)),
                    record.get(GEONAMES_LATITUDE).unwrap_or(""),
                    record.get(GEONAMES_LONGITUDE).unwrap_or(""),
                ));
            }
        }
    }

    stats.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok((locations, stats))
}

/// Assemble a location from raw fields, or `None` if the record is unusable.
fn build_location(
    postal_code: String,
    place_name: String,
    state: Option<String>,
    state_code: Option<String>,
    county: Option<String>,
    latitude: &str,
    longitude: &str,
) -> Option<Location> {
    if postal_code.is_empty() {
        return None;
    }

    let latitude: f64 = latitude.parse().ok()?;
    let longitude: f64 = longitude.parse().ok()?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return None;
    }

    Some(Location {
        postal_code,
        place_name,
        coordinate,
        state: non_empty(state),
        state_code: non_empty(state_code),
        county: non_empty(county),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const CSV_HEADER: &str = "country code,postal code,place name,admin name1,admin code1,admin name2,admin code2,latitude,longitude";

    fn csv_dataset(rows: &[&str]) -> String {
        let mut data = String::from(CSV_HEADER);
        for row in rows {
            data.push('\n');
            data.push_str(row);
        }
        data
    }

    #[test]
    fn test_read_csv() {
        let data = csv_dataset(&[
            "US,99509,Anchorage,Alaska,AK,Anchorage Municipality,020,61.2181,-149.9003",
            "US,99660,Saint Paul Island,Alaska,AK,Aleutians West (CA),016,57.1842,-170.2764",
        ]);

        let (locations, stats) = read_locations(data.as_bytes(), DatasetFormat::Csv).unwrap();

        assert_eq!(stats.records_loaded, 2);
        assert_eq!(stats.records_skipped, 0);
        assert_eq!(locations[0].postal_code, "99509");
        assert_eq!(locations[0].place_name, "Anchorage");
        assert_eq!(locations[0].state.as_deref(), Some("Alaska"));
        assert_eq!(locations[0].state_code.as_deref(), Some("AK"));
        assert_eq!(locations[1].coordinate, Coordinate::new(57.1842, -170.2764));
        assert_eq!(locations[1].county.as_deref(), Some("Aleutians West (CA)"));
    }

    #[test]
    fn test_read_csv_skips_bad_records() {
        let data = csv_dataset(&[
            "US,99509,Anchorage,Alaska,AK,,,61.2181,-149.9003",
            "US,,Nowhere,Alaska,AK,,,61.0,-149.0",
            "US,99999,Garbled,Alaska,AK,,,not-a-number,-149.0",
            "US,99998,Off The Map,Alaska,AK,,,95.0,-149.0",
        ]);

        let (locations, stats) = read_locations(data.as_bytes(), DatasetFormat::Csv).unwrap();

        assert_eq!(locations.len(), 1);
        assert_eq!(stats.records_loaded, 1);
        assert_eq!(stats.records_skipped, 3);
        assert_eq!(locations[0].county, None);
    }

    #[test]
    fn test_read_csv_missing_column() {
        let data = "zip,lat,lon\n99509,61.2181,-149.9003";
        let result = read_locations(data.as_bytes(), DatasetFormat::Csv);
        assert!(matches!(result, Err(StoreError::Csv(_))));
    }

    #[test]
    fn test_read_geonames_dump() {
        let data = "US\t99509\tAnchorage\tAlaska\tAK\tAnchorage Municipality\t020\t\t\t61.2181\t-149.9003\t1\n\
                    US\t99660\tSaint Paul Island\tAlaska\tAK\tAleutians West (CA)\t016\t\t\t57.1842\t-170.2764\t1\n\
                    US\t00000\tTruncated\tAlaska\n";

        let (locations, stats) = read_locations(data.as_bytes(), DatasetFormat::GeoNames).unwrap();

        assert_eq!(stats.records_loaded, 2);
        assert_eq!(stats.records_skipped, 1);
        assert_eq!(locations[1].postal_code, "99660");
        assert_eq!(locations[1].place_name, "Saint Paul Island");
        assert_eq!(locations[1].coordinate.latitude, 57.1842);
    }

    #[test]
    fn test_load_locations_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zipcodes.csv");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            "{}",
            csv_dataset(&["US,36027,Eufaula,Alabama,AL,Barbour,005,31.9114,-85.1451"])
        )
        .unwrap();

        let (locations, stats) = load_locations(&path).unwrap();
        assert_eq!(stats.records_loaded, 1);
        assert_eq!(locations[0].place_name, "Eufaula");
    }

    #[test]
    fn test_load_locations_unsupported_format() {
        let result = load_locations("zipcodes.parquet");
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_load_locations_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_locations(temp_dir.path().join("absent.csv"));
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
