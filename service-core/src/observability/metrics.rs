//! Process-wide HTTP metrics registered in the default Prometheus registry.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, histogram_opts, opts,
    register_histogram_vec, register_int_counter_vec,
};

/// HTTP request counter by method, route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL")
});

/// HTTP request duration histogram by method and route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        ),
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION")
});

/// Render every metric in the default registry in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
