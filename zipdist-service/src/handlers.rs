//! HTTP request handlers for the distance service.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use zipdist::{
    DistanceRequest, DistanceResponse, DistanceResult, Location, ResolveError, ValidationError,
};

use crate::AppState;

/// Body of a distance request.
///
/// Every field is optional at the wire level so that missing fields are
/// reported as validation errors rather than deserialization failures.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistanceRequestBody {
    /// Origin postal code.
    #[schema(example = "99509")]
    pub origin_zip_code: Option<String>,
    /// Destination postal codes (non-empty).
    #[schema(value_type = Option<Vec<String>>)]
    pub destination_zip_codes: Option<Value>,
    /// One of `km` (default), `miles`, `meters`, `feet`. Other values are
    /// computed as kilometers and echoed back unchanged.
    #[schema(example = "km")]
    pub unit: Option<String>,
}

impl DistanceRequestBody {
    /// Validate the body into a [`DistanceRequest`].
    pub fn into_request(self) -> Result<DistanceRequest, ValidationError> {
        let origin = self
            .origin_zip_code
            .filter(|code| !code.is_empty())
            .ok_or(ValidationError::MissingOrigin)?;

        let destinations = match self.destination_zip_codes {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(code) => Ok(code),
                        _ => Err(ValidationError::InvalidDestinations),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(ValidationError::InvalidDestinations),
        };

        DistanceRequest::from_parts(Some(origin), destinations, self.unit.as_deref())
    }
}

/// Summary of the resolved origin.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginSummary {
    pub zip_code: String,
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for OriginSummary {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude(),
            longitude: location.longitude(),
            zip_code: location.postal_code,
            place_name: location.place_name,
        }
    }
}

/// Distance to one destination.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestinationDistance {
    pub zip_code: String,
    pub place_name: String,
    /// Distance from the origin, rounded for the unit.
    pub distance: f64,
    pub unit: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<DistanceResult> for DestinationDistance {
    fn from(result: DistanceResult) -> Self {
        Self {
            latitude: result.location.latitude(),
            longitude: result.location.longitude(),
            zip_code: result.location.postal_code,
            place_name: result.location.place_name,
            distance: result.distance,
            unit: result.unit,
        }
    }
}

/// Non-fatal problems with a request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warnings {
    /// Destination postal codes that could not be resolved, in request order.
    pub not_found: Vec<String>,
}

/// Successful distance response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DistanceResponseBody {
    pub origin: OriginSummary,
    /// Destinations sorted nearest-first.
    pub destinations: Vec<DestinationDistance>,
    /// Present only when some destinations were not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Warnings>,
}

impl From<DistanceResponse> for DistanceResponseBody {
    fn from(response: DistanceResponse) -> Self {
        let warnings = if response.not_found.is_empty() {
            None
        } else {
            Some(Warnings {
                not_found: response.not_found,
            })
        };

        Self {
            origin: response.origin.into(),
            destinations: response
                .destinations
                .into_iter()
                .map(DestinationDistance::from)
                .collect(),
            warnings,
        }
    }
}

/// A single postal code with its administrative details.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZipCodeResponse {
    pub zip_code: String,
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

impl From<Location> for ZipCodeResponse {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude(),
            longitude: location.longitude(),
            zip_code: location.postal_code,
            place_name: location.place_name,
            state: location.state,
            state_code: location.state_code,
            county: location.county,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Human-readable status message.
    pub message: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of locations in cache.
    pub cached_locations: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Calculate distances from an origin postal code to each destination.
///
/// # Returns
///
/// - `200 OK` with destinations sorted nearest-first
/// - `400 Bad Request` if the body is malformed or fails validation
/// - `404 Not Found` if the origin postal code is unknown
/// - `500 Internal Server Error` on lookup failures
#[utoipa::path(
    post,
    path = "/api/distances",
    request_body = DistanceRequestBody,
    responses(
        (status = 200, description = "Distances sorted nearest-first", body = DistanceResponseBody),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Origin postal code not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "distances"
)]
pub async fn calculate_distances(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DistanceRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Malformed distance request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid request body: {}", rejection.body_text()),
                }),
            )
                .into_response();
        }
    };

    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return error_response(e.into()),
    };

    tracing::debug!(
        origin = request.origin(),
        destinations = request.destinations().len(),
        unit = request.unit_name(),
        "Distance request"
    );

    match state.resolver.resolve(&request).await {
        Ok(response) => {
            tracing::info!(
                origin = request.origin(),
                resolved = response.destinations.len(),
                not_found = response.not_found.len(),
                "Distances calculated"
            );
            (StatusCode::OK, Json(DistanceResponseBody::from(response))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Look up a single postal code.
#[utoipa::path(
    get,
    path = "/api/zipcodes/{code}",
    params(("code" = String, Path, description = "Postal code, e.g. 99509")),
    responses(
        (status = 200, description = "Postal code found", body = ZipCodeResponse),
        (status = 404, description = "Postal code not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "distances"
)]
pub async fn get_zip_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match state.resolver.lookup(&code).await {
        Ok(Some(location)) => {
            (StatusCode::OK, Json(ZipCodeResponse::from(location))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Postal code not found: {}", code),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Map a resolver error to a status code and message.
///
/// Internal failures are reported generically; the resolver has already
/// logged their detail.
fn error_response(e: ResolveError) -> Response {
    let (status, message) = match &e {
        ResolveError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        ResolveError::OriginNotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        ResolveError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    if e.is_client_error() {
        tracing::warn!(error = %e, "Distance request rejected");
    }

    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Health check endpoint.
///
/// Returns service status, current time and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Postal code distance API is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get cache statistics.
///
/// Returns information about the location cache.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Cache statistics", body = StatsResponse)),
    tag = "system"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.resolver.store().cache_stats();

    Json(StatsResponse {
        cached_locations: stats.entry_count,
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}

/// API index with an example request.
pub async fn index() -> Json<Value> {
    Json(serde_json::json!({
        "name": "Zip Distance API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "API to calculate distances between postal codes",
        "endpoints": {
            "GET /health": "Check API status",
            "GET /stats": "Lookup cache statistics",
            "GET /docs": "OpenAPI documentation",
            "GET /api/zipcodes/{code}": "Look up a single postal code",
            "POST /api/distances": "Calculate distances between postal codes"
        },
        "example": {
            "method": "POST",
            "url": "/api/distances",
            "body": {
                "originZipCode": "99509",
                "destinationZipCodes": ["99660", "99547"],
                "unit": "km"
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipdist::{Coordinate, DistanceUnit};

    fn parse(json: &str) -> Result<DistanceRequest, ValidationError> {
        serde_json::from_str::<DistanceRequestBody>(json)
            .unwrap()
            .into_request()
    }

    #[test]
    fn test_distance_request_deserialize() {
        let request = parse(
            r#"{"originZipCode": "99509", "destinationZipCodes": ["99660", "99547"], "unit": "miles"}"#,
        )
        .unwrap();
        assert_eq!(request.origin(), "99509");
        assert_eq!(request.destinations().len(), 2);
        assert_eq!(request.unit(), DistanceUnit::Miles);

        let request = parse(r#"{"originZipCode": "99509", "destinationZipCodes": ["99660"]}"#).unwrap();
        assert_eq!(request.unit(), DistanceUnit::Kilometers);
    }

    #[test]
    fn test_distance_request_validation() {
        assert_eq!(
            parse(r#"{"destinationZipCodes": ["99660"]}"#),
            Err(ValidationError::MissingOrigin)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "", "destinationZipCodes": ["99660"]}"#),
            Err(ValidationError::MissingOrigin)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "99509"}"#),
            Err(ValidationError::MissingDestinations)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "99509", "destinationZipCodes": null}"#),
            Err(ValidationError::MissingDestinations)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "99509", "destinationZipCodes": "99660"}"#),
            Err(ValidationError::InvalidDestinations)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "99509", "destinationZipCodes": [99660]}"#),
            Err(ValidationError::InvalidDestinations)
        );
        assert_eq!(
            parse(r#"{"originZipCode": "99509", "destinationZipCodes": []}"#),
            Err(ValidationError::EmptyDestinations)
        );
        assert!(parse(r#"{"originZipCode": " ", "destinationZipCodes": ["99660"]}"#).is_ok());

        let request = parse(
            r#"{"originZipCode": "99509", "destinationZipCodes": ["99660"], "unit": "yards"}"#,
        )
        .unwrap();
        assert_eq!(request.unit(), DistanceUnit::Kilometers);
        assert_eq!(request.unit_name(), "yards");
    }

    #[test]
    fn test_distance_response_serialize() {
        let origin = Location::new("99509", "Anchorage", Coordinate::new(61.2181, -149.9003));
        let destination =
            Location::new("99660", "Saint Paul Island", Coordinate::new(57.1842, -170.2764));

        let response = DistanceResponseBody::from(DistanceResponse {
            origin,
            destinations: vec![DistanceResult {
                location: destination,
                distance: 1237.48,
                unit: "km".to_string(),
            }],
            not_found: vec![],
        });
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["origin"]["zipCode"], "99509");
        assert_eq!(json["origin"]["placeName"], "Anchorage");
        assert_eq!(json["destinations"][0]["zipCode"], "99660");
        assert_eq!(json["destinations"][0]["distance"], 1237.48);
        assert_eq!(json["destinations"][0]["unit"], "km");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_warnings_serialize() {
        let origin = Location::new("99509", "Anchorage", Coordinate::new(61.2181, -149.9003));
        let response = DistanceResponseBody::from(DistanceResponse {
            origin,
            destinations: vec![],
            not_found: vec!["00000".to_string()],
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["warnings"]["notFound"][0], "00000");
    }

    #[test]
    fn test_zip_code_response_skips_missing_details() {
        let location = Location::new("99509", "Anchorage", Coordinate::new(61.2181, -149.9003))
            .with_state("Alaska", "AK");
        let json = serde_json::to_value(ZipCodeResponse::from(location)).unwrap();

        assert_eq!(json["stateCode"], "AK");
        assert!(json.get("county").is_none());
    }
}
