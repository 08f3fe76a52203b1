//! HTTP tests for the public browsing routes.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use sthana_store::{DocPath, DocumentStore, Fields};

async fn seed_temple(app: &TestApp, id: &str, name: &str, created_at: &str) {
    let mut data = Fields::new();
    data.insert("name".into(), json!(name));
    data.insert("createdAt".into(), json!(created_at));
    app.store
        .create(&DocPath::parse(&format!("temples/{id}")).unwrap(), data)
        .await
        .unwrap();
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn list_temples_newest_first() {
    let app = TestApp::new();
    seed_temple(&app, "a", "Meenakshi Amman", "2024-02-01T00:00:00.000Z").await;
    seed_temple(&app, "b", "Jagannath", "2024-03-01T00:00:00.000Z").await;
    seed_temple(&app, "c", "Kamakhya", "2024-01-01T00:00:00.000Z").await;

    let (status, list) = app.request("GET", "/api/temples", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&list), ["b", "a", "c"]);

    let (_, list) = app.request("GET", "/api/temples?limit=2", None, None).await;
    assert_eq!(ids(&list), ["b", "a"]);
}

#[tokio::test]
async fn list_temples_filters_by_name() {
    let app = TestApp::new();
    seed_temple(&app, "a", "Meenakshi Amman", "2024-02-01T00:00:00.000Z").await;
    seed_temple(&app, "b", "Jagannath", "2024-03-01T00:00:00.000Z").await;
    seed_temple(&app, "c", "Amarnath", "2024-01-01T00:00:00.000Z").await;

    let (_, list) = app.request("GET", "/api/temples?q=NATH", None, None).await;
    assert_eq!(ids(&list), ["b", "c"]);

    let (_, list) = app.request("GET", "/api/temples?q=nath&limit=1", None, None).await;
    assert_eq!(ids(&list), ["b"]);
}

#[tokio::test]
async fn get_temple_and_missing_temple() {
    let app = TestApp::new();
    seed_temple(&app, "a", "Meenakshi Amman", "2024-02-01T00:00:00.000Z").await;

    let (status, doc) = app.request("GET", "/api/temples/a", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["name"], "Meenakshi Amman");

    let (status, body) = app.request("GET", "/api/temples/zzz", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Temple 'zzz' not found");
}

#[tokio::test]
async fn media_lists_subcollection_of_existing_temple() {
    let app = TestApp::new();
    seed_temple(&app, "a", "Meenakshi Amman", "2024-02-01T00:00:00.000Z").await;

    let (status, _) = app
        .admin(
            "POST",
            "/api/admin/data?collection=temples&id=a&subcollection=media&subId=gopuram",
            Some(json!({"url": "https://cdn.example.org/gopuram.jpg"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = app.request("GET", "/api/temples/a/media", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&list), ["gopuram"]);

    let (status, _) = app.request("GET", "/api/temples/zzz/media", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_routes_are_read_only() {
    let app = TestApp::new();
    let (status, _) = app
        .request("POST", "/api/temples", None, Some(json!({"name": "x"})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn bad_limit_is_a_json_error() {
    let app = TestApp::new();
    let (status, body) = app
        .request("GET", "/api/temples?limit=lots", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}
