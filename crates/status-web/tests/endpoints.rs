//! Endpoint tests for status-web, driven in-process with `oneshot`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use database::{ConnectionManager, MemoryDriver, StoreOptions};
use serde_json::Value;
use tower::ServiceExt;

fn manager() -> (Arc<MemoryDriver>, ConnectionManager) {
    let driver = Arc::new(MemoryDriver::new());
    let manager = ConnectionManager::new(
        driver.clone(),
        StoreOptions::new("memory://status").with_heartbeat_interval(Duration::ZERO),
    );
    (driver, manager)
}

async fn get_json(manager: &ConnectionManager, uri: &str) -> (StatusCode, Value) {
    get_json_since(manager, Instant::now(), uri).await
}

async fn get_json_since(
    manager: &ConnectionManager,
    started: Instant,
    uri: &str,
) -> (StatusCode, Value) {
    let response = status_web::app(manager.clone(), started)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let (_driver, manager) = manager();

    let (status, body) = get_json(&manager, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "MubAI Bot API");
    assert_eq!(body["endpoints"]["health"], "/health");
    assert_eq!(body["endpoints"]["status"], "/status");
}

#[tokio::test]
async fn test_health_reports_disconnected_store() {
    let (_driver, manager) = manager();

    let (status, body) = get_json(&manager, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "disconnected");
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_uptime_counts_from_process_start() {
    let (_driver, manager) = manager();
    let started = Instant::now().checked_sub(Duration::from_secs(30)).unwrap();

    let (_, body) = get_json_since(&manager, started, "/health").await;

    assert!(body["uptime"].as_f64().unwrap() >= 30.0);
}

#[tokio::test]
async fn test_health_reports_connected_store() {
    let (_driver, manager) = manager();
    manager.connect().await.unwrap();

    let (_, body) = get_json(&manager, "/health").await;

    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_status_without_store() {
    let (_driver, manager) = manager();

    let (status, body) = get_json(&manager, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bot"], "running");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["store"], "not connected");
}

#[tokio::test]
async fn test_status_names_open_store() {
    let (_driver, manager) = manager();
    manager.connect().await.unwrap();

    let (_, body) = get_json(&manager, "/status").await;

    assert_eq!(body["database"], "connected");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_driver, manager) = manager();

    let response = status_web::app(manager, Instant::now())
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
