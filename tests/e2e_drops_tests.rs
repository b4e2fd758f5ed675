//! End-to-end tests for the drop endpoints
//!
//! Tests POST /v1/drops, GET /v1/drops/{id} and GET /v1/drops/nearby
//! against a SQLite store in a temp dir.

mod common;

use common::{
    seed_drop, DropSeed, TestClient, TestServer, FAR_LAT, FAR_LNG, LISTENER_LAT, LISTENER_LNG,
    NEAR_LAT, NEAR_LNG,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn listener_query() -> Vec<(&'static str, String)> {
    vec![
        ("lat", LISTENER_LAT.to_string()),
        ("lng", LISTENER_LNG.to_string()),
    ]
}

#[tokio::test]
async fn test_home_reports_version() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.home().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_then_fetch_drop() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .create_drop(json!({
            "trackName": "Hype Boy",
            "coverUrl": "https://covers.example.com/hype.jpg",
            "userText": "First day of spring",
            "mood": "Happy",
            "latitude": NEAR_LAT,
            "longitude": NEAR_LNG,
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["success"], true);
    assert_eq!(created["message"], "Drop saved successfully!");
    let id = created["id"].as_str().unwrap().to_string();

    let response = client.get_drop(&id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let drop: Value = response.json().await.unwrap();
    assert_eq!(drop["trackName"], "Hype Boy");
    assert_eq!(drop["artistName"], "Unknown Artist");
    assert_eq!(drop["mood"], "happy");
    assert_eq!(drop["likeCount"], 0);
    assert_eq!(drop["ownerId"], "anonymous");
    assert!(drop["createdAt"].as_i64().unwrap() > 0);

    assert_eq!(server.store.count_drops().unwrap(), 1);
}

#[tokio::test]
async fn test_create_drop_requires_track_and_location() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .create_drop(json!({"trackName": "  ", "latitude": NEAR_LAT, "longitude": NEAR_LNG}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Required information (track name, location) is missing."
    );

    let response = client.create_drop(json!({"trackName": "Ditto"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.store.count_drops().unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_drop_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_drop("no-such-drop").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nearby_lists_closest_first_within_radius() {
    let server = TestServer::spawn().await;
    let store = server.store.as_ref();
    seed_drop(
        store,
        DropSeed {
            track_name: "Two Blocks Away",
            lat: 37.5740,
            lng: 126.9779,
            ..Default::default()
        },
    );
    seed_drop(store, DropSeed::default());
    seed_drop(
        store,
        DropSeed {
            track_name: "Busan Sea",
            lat: FAR_LAT,
            lng: FAR_LNG,
            ..Default::default()
        },
    );
    let client = TestClient::new(server.base_url.clone());

    let response = client.nearby(&listener_query()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let drops: Vec<Value> = response.json().await.unwrap();
    let names: Vec<&str> = drops
        .iter()
        .map(|d| d["trackName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ditto", "Two Blocks Away"]);
    assert!(drops[0]["distanceKm"].as_f64().unwrap() < drops[1]["distanceKm"].as_f64().unwrap());
}

#[tokio::test]
async fn test_nearby_filters_by_mood() {
    let server = TestServer::spawn().await;
    let store = server.store.as_ref();
    seed_drop(store, DropSeed::default());
    seed_drop(
        store,
        DropSeed {
            track_name: "Rainy Day",
            mood: "sad",
            ..Default::default()
        },
    );
    let client = TestClient::new(server.base_url.clone());

    let mut query = listener_query();
    query.push(("mood", "sad".to_string()));
    let response = client.nearby(&query).await;
    assert_eq!(response.status(), StatusCode::OK);
    let drops: Vec<Value> = response.json().await.unwrap();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0]["trackName"], "Rainy Day");
}

#[tokio::test]
async fn test_nearby_validates_query() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .nearby(&[("lat", LISTENER_LAT.to_string())])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut query = listener_query();
    query.push(("radius_km", "-1".to_string()));
    let response = client.nearby(&query).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .nearby(&[("lat", "north".to_string()), ("lng", "1".to_string())])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
