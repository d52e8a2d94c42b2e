#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, missing_debug_implementations, unreachable_pub)]
use contact_relay::adapters::database::memory::MemoryConnector;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

mod common;

async fn health(app: &common::TestApp) -> Value {
    let resp = app.client.get(format!("{}/api/health", app.base_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_health_before_first_connection() {
    let app = common::TestApp::spawn().await;

    let body = health(&app).await;

    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["environment"], "test");
    assert!(!body["timestamp"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_tracks_connection_lifecycle() {
    let app = common::TestApp::spawn_with(
        common::get_test_config(),
        MemoryConnector::new().with_latency(Duration::from_millis(300)),
    )
    .await;

    let connections = app.connections.clone();
    let attempt = tokio::spawn(async move { connections.acquire().await.map(|_| ()) });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(health(&app).await["database"], "connecting");

    attempt.await.unwrap().unwrap();
    assert_eq!(health(&app).await["database"], "connected");

    app.connections.close().await;
    assert_eq!(health(&app).await["database"], "disconnected");
}

#[tokio::test]
async fn test_health_never_fails_when_database_is_down() {
    let app = common::TestApp::spawn_with(common::get_test_config(), MemoryConnector::new().failing(10)).await;

    let resp = app.submit(&json!({"name": "Ann", "email": "ann@x.com", "message": "hi"})).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = health(&app).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_diagnostics_echoes_method() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.post(format!("{}/api/test", app.base_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "API is working!");
    assert_eq!(body["method"], "POST");
}
