//! SQLite-backed lookup store.
//!
//! This module is only available when the `sqlite` feature is enabled.
//!
//! The database holds a single `zipcodes` table indexed on `postal_code`. It
//! is filled once by [`SqliteStore::import_dataset`] (the `zipdist import`
//! command) and then opened read-mostly by the service.
//!
//! ```ignore
//! use zipdist::sqlite::SqliteStore;
//!
//! let store = SqliteStore::create("data/zipcodes.db").await?;
//! let stats = store.import_dataset("data/US.txt").await?;
//! println!("Imported {} records", stats.records_loaded);
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::dataset::{load_locations, LoadStats};
use crate::error::StoreError;
use crate::location::{Coordinate, Location};
use crate::store::LocationStore;

const MAX_CONNECTIONS: u32 = 5;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS zipcodes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        postal_code TEXT NOT NULL,
        place_name TEXT NOT NULL,
        admin_name1 TEXT,
        admin_code1 TEXT,
        admin_name2 TEXT,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    )
"#;

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_postal_code ON zipcodes(postal_code)";

const SELECT_LOCATIONS: &str = r#"
    SELECT postal_code, place_name, admin_name1, admin_code1, admin_name2, latitude, longitude
    FROM zipcodes
"#;

/// A [`LocationStore`] reading from a SQLite database.
///
/// Duplicate postal codes resolve to the row inserted first.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open an existing database.
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist or is not a SQLite database.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(false);
        Self::connect(options).await
    }

    /// Open a database, creating the file and schema if needed.
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let store = Self::connect(options).await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Create the `zipcodes` table and its postal code index if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Bulk-load a dataset file into the database.
    ///
    /// All valid records are inserted in a single transaction; a failure
    /// leaves the table unchanged. Records already present are not
    /// deduplicated, so importing the same file twice doubles the rows
    /// (lookups still return the first one).
    pub async fn import_dataset<P: AsRef<Path>>(&self, path: P) -> Result<LoadStats, StoreError> {
        let start = Instant::now();
        self.ensure_schema().await?;

        let (locations, mut stats) = load_locations(path)?;

        let mut tx = self.pool.begin().await?;
        for location in &locations {
            sqlx::query(
                r#"
                INSERT INTO zipcodes
                (postal_code, place_name, admin_name1, admin_code1, admin_name2, latitude, longitude)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(location.postal_code.as_str())
            .bind(location.place_name.as_str())
            .bind(location.state.as_deref())
            .bind(location.state_code.as_deref())
            .bind(location.county.as_deref())
            .bind(location.coordinate.latitude)
            .bind(location.coordinate.longitude)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(stats)
    }

    /// Number of rows in the `zipcodes` table.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM zipcodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

fn row_to_location(row: &SqliteRow) -> Result<Location, sqlx::Error> {
    Ok(Location {
        postal_code: row.try_get("postal_code")?,
        place_name: row.try_get("place_name")?,
        coordinate: Coordinate::new(row.try_get("latitude")?, row.try_get("longitude")?),
        state: row.try_get("admin_name1")?,
        state_code: row.try_get("admin_code1")?,
        county: row.try_get("admin_name2")?,
    })
}

#[async_trait]
impl LocationStore for SqliteStore {
    async fn find_one(&self, code: &str) -> Result<Option<Location>, StoreError> {
        let sql = format!("{SELECT_LOCATIONS} WHERE postal_code = ? ORDER BY id LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_location).transpose()?)
    }

    async fn find_many(&self, codes: &[String]) -> Result<Vec<Location>, StoreError> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = codes
            .iter()
            .map(String::as_str)
            .filter(|code| seen.insert(*code))
            .collect();

        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_LOCATIONS);
        builder.push(" WHERE postal_code IN (");
        let mut separated = builder.separated(", ");
        for code in unique {
            separated.push_bind(code);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let locations = rows
            .iter()
            .map(row_to_location)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }
}
