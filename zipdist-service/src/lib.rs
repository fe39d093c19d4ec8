//! Zipdist Service Library
//!
//! HTTP handlers, routing and OpenAPI documentation for the postal code
//! distance service. Used by both the zipdist-service binary and the
//! integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use zipdist::{DistanceResolver, SharedStore};

/// Application state shared across handlers.
pub struct AppState {
    /// Resolver for distance and lookup queries.
    pub resolver: DistanceResolver<SharedStore>,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            resolver: DistanceResolver::new(store),
        }
    }
}

/// OpenAPI documentation for the zipdist service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Zip Distance Service",
        version = "0.1.0",
        description = "REST API for straight-line distances between US postal codes.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::calculate_distances,
        handlers::get_zip_code,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::DistanceRequestBody,
            handlers::DistanceResponseBody,
            handlers::OriginSummary,
            handlers::DestinationDistance,
            handlers::Warnings,
            handlers::ZipCodeResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "distances", description = "Distance and postal code endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with documentation, tracing and CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .route("/api/distances", post(handlers::calculate_distances))
        .route("/api/zipcodes/:code", get(handlers::get_zip_code))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    DistanceRequestBody, DistanceResponseBody, ErrorResponse, HealthResponse, StatsResponse,
    ZipCodeResponse,
};
