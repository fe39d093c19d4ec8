//! Integration tests for the HTTP API.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use zipdist::{
    CachedStore, Coordinate, Location, LocationStore, MemoryStore, SharedStore, StoreError,
};
use zipdist_service::{router, AppState};

fn test_locations() -> Vec<Location> {
    vec![
        Location::new("99509", "Anchorage", Coordinate::new(61.2181, -149.9003))
            .with_state("Alaska", "AK")
            .with_county("Anchorage Municipality"),
        Location::new("99660", "Saint Paul Island", Coordinate::new(57.1842, -170.2764))
            .with_state("Alaska", "AK"),
        Location::new("99547", "Atka", Coordinate::new(52.1961, -174.2006)),
        Location::new("36027", "Eufaula", Coordinate::new(31.9114, -85.1451)),
    ]
}

fn server_with(inner: Arc<dyn LocationStore>) -> TestServer {
    let store: SharedStore = CachedStore::new(inner, 100);
    TestServer::new(router(Arc::new(AppState::new(store)))).unwrap()
}

/// Create a test server backed by an in-memory store.
fn create_test_server() -> TestServer {
    server_with(Arc::new(MemoryStore::from_locations(test_locations())))
}

/// A store whose backend is always down.
struct UnavailableStore;

#[async_trait]
impl LocationStore for UnavailableStore {
    async fn find_one(&self, _code: &str) -> Result<Option<Location>, StoreError> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn find_many(&self, _codes: &[String]) -> Result<Vec<Location>, StoreError> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"], "OK");
    assert!(json["timestamp"].is_string());
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_index_has_example() {
    let server = create_test_server();

    let response = server.get("/").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["example"]["url"], "/api/distances");
}

#[tokio::test]
async fn test_distances_km() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({
            "originZipCode": "99509",
            "destinationZipCodes": ["99660"],
            "unit": "km"
        }))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["origin"]["zipCode"], "99509");
    assert_eq!(json["origin"]["placeName"], "Anchorage");

    let destination = &json["destinations"][0];
    assert_eq!(destination["zipCode"], "99660");
    assert_eq!(destination["placeName"], "Saint Paul Island");
    assert_eq!(destination["unit"], "km");
    assert_eq!(destination["distance"].as_f64().unwrap(), 1237.48);
    assert_eq!(destination["latitude"].as_f64().unwrap(), 57.1842);
    assert!(json.get("warnings").is_none());
}

#[tokio::test]
async fn test_distances_default_unit_is_km() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({"originZipCode": "99509", "destinationZipCodes": ["99660"]}))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["destinations"][0]["unit"], "km");
}

#[tokio::test]
async fn test_distances_meters_are_whole() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({
            "originZipCode": "99509",
            "destinationZipCodes": ["99660"],
            "unit": "meters"
        }))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    let distance = json["destinations"][0]["distance"].as_f64().unwrap();
    assert_eq!(distance, 1_237_478.0);
    assert_eq!(json["destinations"][0]["unit"], "meters");
}

#[tokio::test]
async fn test_distances_sorted_nearest_first() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({
            "originZipCode": "36027",
            "destinationZipCodes": ["99547", "99509", "99660"],
            "unit": "miles"
        }))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    let destinations = json["destinations"].as_array().unwrap();
    assert_eq!(destinations.len(), 3);

    let distances: Vec<f64> = destinations
        .iter()
        .map(|d| d["distance"].as_f64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(destinations[0]["zipCode"], "99509");
}

#[tokio::test]
async fn test_distances_partial_not_found() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({
            "originZipCode": "99509",
            "destinationZipCodes": ["99660", "00000", "11111"]
        }))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["destinations"].as_array().unwrap().len(), 1);
    assert_eq!(json["warnings"]["notFound"], json!(["00000", "11111"]));
}

#[tokio::test]
async fn test_distances_origin_not_found() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({"originZipCode": "99999", "destinationZipCodes": ["99660"]}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let json: Value = response.json();
    assert_eq!(json["error"], "Origin postal code not found: 99999");
}

#[tokio::test]
async fn test_distances_validation_errors() {
    let server = create_test_server();

    let cases = [
        (
            json!({"destinationZipCodes": ["99660"]}),
            "Invalid parameters. originZipCode is required.",
        ),
        (
            json!({"originZipCode": "99509"}),
            "Invalid parameters. destinationZipCodes is required.",
        ),
        (
            json!({"originZipCode": "99509", "destinationZipCodes": []}),
            "The destination postal codes list cannot be empty.",
        ),
    ];

    for (body, message) in cases {
        let response = server.post("/api/distances").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let json: Value = response.json();
        assert_eq!(json["error"], message);
    }
}

#[tokio::test]
async fn test_distances_destinations_not_array() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({"originZipCode": "99509", "destinationZipCodes": "99660"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_distances_unknown_unit_uses_kilometers() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({
            "originZipCode": "99509",
            "destinationZipCodes": ["99660"],
            "unit": "furlongs"
        }))
        .await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["destinations"][0]["distance"].as_f64().unwrap(), 1237.48);
    assert_eq!(json["destinations"][0]["unit"], "furlongs");
}

#[tokio::test]
async fn test_distances_whitespace_origin_not_found() {
    let server = create_test_server();

    let response = server
        .post("/api/distances")
        .json(&json!({"originZipCode": "   ", "destinationZipCodes": ["99660"]}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_distances_malformed_body() {
    let server = create_test_server();

    let response = server.post("/api/distances").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let json: Value = response.json();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_distances_store_failure() {
    let server = server_with(Arc::new(UnavailableStore));

    let response = server
        .post("/api/distances")
        .json(&json!({"originZipCode": "99509", "destinationZipCodes": ["99660"]}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = response.json();
    assert_eq!(json["error"], "Internal server error");
}

#[tokio::test]
async fn test_zip_code_lookup() {
    let server = create_test_server();

    let response = server.get("/api/zipcodes/99509").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["zipCode"], "99509");
    assert_eq!(json["state"], "Alaska");
    assert_eq!(json["stateCode"], "AK");
    assert_eq!(json["county"], "Anchorage Municipality");

    let response = server.get("/api/zipcodes/00000").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_track_cache() {
    let server = create_test_server();

    let body = json!({"originZipCode": "99509", "destinationZipCodes": ["99660"]});
    server.post("/api/distances").json(&body).await.assert_status_ok();
    server.post("/api/distances").json(&body).await.assert_status_ok();

    let response = server.get("/stats").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["cache_misses"], 2);
    assert_eq!(json["cache_hits"], 2);
    assert_eq!(json["hit_rate"].as_f64().unwrap(), 0.5);
}

#[tokio::test]
async fn test_openapi_document() {
    let server = create_test_server();

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();

    let json: Value = response.json();
    assert!(json["paths"]["/api/distances"]["post"].is_object());
}
