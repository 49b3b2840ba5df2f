use crate::observability::metrics::{HTTP_REQUEST_DURATION, HTTP_REQUESTS_TOTAL};
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Record request count and latency per matched route.
///
/// Install with `Router::route_layer` so the matched path template is known;
/// unmatched requests are grouped under `unmatched`.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), path.as_str()])
        .observe(start.elapsed().as_secs_f64());

    response
}
