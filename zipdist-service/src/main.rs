//! Zipdist Service - HTTP microservice for postal code distances.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ZIPDIST_DATASET` | GeoNames dataset file (.csv or .txt) | `data/zipcodes.csv` |
//! | `ZIPDIST_DATABASE` | SQLite database built by `zipdist import` | None |
//! | `ZIPDIST_CACHE_SIZE` | Maximum locations in cache | 10000 |
//! | `ZIPDIST_PORT` | HTTP server port | 3001 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /api/distances` - Distances from one origin to many destinations
//! - `GET /api/zipcodes/{code}` - Look up a single postal code
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zipdist::StoreBuilder;
use zipdist_service::AppState;

const DEFAULT_DATASET: &str = "data/zipcodes.csv";
const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zipdist_service=info,zipdist=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("ZIPDIST_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    // The library reads ZIPDIST_DATASET, ZIPDIST_DATABASE and ZIPDIST_CACHE_SIZE
    let store = match StoreBuilder::from_env() {
        Ok(builder) => builder.build().await?,
        Err(_) => {
            tracing::warn!(
                dataset = DEFAULT_DATASET,
                "ZIPDIST_DATASET and ZIPDIST_DATABASE not set, using default dataset"
            );
            StoreBuilder::new().dataset(DEFAULT_DATASET).build().await?
        }
    };

    tracing::info!(
        cache_capacity = store.cache_capacity(),
        port = port,
        "Starting zipdist service"
    );

    let app = zipdist_service::router(Arc::new(AppState::new(store)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
