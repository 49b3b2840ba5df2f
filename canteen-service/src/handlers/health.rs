//! Health, readiness and metrics endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::observability::gather_metrics;

use crate::AppState;

/// Liveness probe: the active backend answers.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.storage.active().await;
    match storage.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "canteen-service",
                    "version": env!("CARGO_PKG_VERSION"),
                    "storage": storage.backend(),
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, backend = %storage.backend(), "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "canteen-service",
                    "storage": storage.backend(),
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness probe.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.storage.active().await;
    match storage.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        gather_metrics(),
    )
}
