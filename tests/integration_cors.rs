#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, missing_debug_implementations, unreachable_pub)]
use contact_relay::adapters::database::memory::MemoryConnector;
use reqwest::{Method, StatusCode};

mod common;

#[tokio::test]
async fn test_preflight_for_configured_origin() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .request(Method::OPTIONS, format!("{}/api/contact", app.base_url))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "http://localhost:3000");
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");
    assert_eq!(app.connector.attempts(), 0);
}

#[tokio::test]
async fn test_other_origins_are_not_allowed() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .request(Method::OPTIONS, format!("{}/api/contact", app.base_url))
        .header("origin", "http://evil.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert!(!resp.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_plain_options_short_circuits() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.request(Method::OPTIONS, format!("{}/api/contact", app.base_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(app.connector.repository().submissions().is_empty());
}

#[tokio::test]
async fn test_any_origin_mode() {
    let mut config = common::get_test_config();
    config.cors.any_origin = true;
    let app = common::TestApp::spawn_with(config, MemoryConnector::new()).await;

    let resp = app
        .client
        .request(Method::OPTIONS, format!("{}/api/contact", app.base_url))
        .header("origin", "http://anywhere.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}
