//! Health check integration tests for canteen-service.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "canteen-service");
    assert_eq!(body["storage"], "local");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn metrics_endpoint_works() {
    let app = TestApp::spawn().await;

    // Generate some traffic first so the counters exist
    app.get("/companies").await;

    let response = app.get("/metrics").await;
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap_or("").contains("text/plain"))
        .unwrap_or(false));

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "test-request-42")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("test-request-42")
    );
}
