//! Metrics module for canteen-service.
//! Prometheus metrics for storage operations and meal recording.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, HistogramVec,
    IntCounterVec,
};
use std::sync::OnceLock;

/// Storage operation duration histogram
pub static STORAGE_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "canteen_storage_operation_duration_seconds",
            "Storage operation duration",
            vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
        ),
        &["backend", "entity", "operation"]
    )
    .expect("Failed to register STORAGE_OPERATION_DURATION")
});

/// Storage operations counter
pub static STORAGE_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Meals recorded counter
pub static MEALS_RECORDED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    STORAGE_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "canteen_storage_operations_total",
                "Total storage operations by backend, entity and operation"
            ),
            &["backend", "entity", "operation"]
        )
        .expect("Failed to register STORAGE_OPERATIONS_TOTAL")
    });

    MEALS_RECORDED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "canteen_meals_recorded_total",
                "Total meals recorded by price source"
            ),
            &["source"]
        )
        .expect("Failed to register MEALS_RECORDED_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("canteen_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*STORAGE_OPERATION_DURATION;
}

/// Record a completed storage operation.
pub fn record_storage_operation(backend: &str, entity: &str, operation: &str) {
    if let Some(counter) = STORAGE_OPERATIONS_TOTAL.get() {
        counter
            .with_label_values(&[backend, entity, operation])
            .inc();
    }
}

/// Record meals written by a daily entry batch.
pub fn record_meals(source: &str, quantity: i32) {
    if let Some(counter) = MEALS_RECORDED_TOTAL.get() {
        counter
            .with_label_values(&[source])
            .inc_by(quantity.max(0) as u64);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
