//! Prometheus metrics for bill-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Reconciliation engine run duration.
pub static RECONCILE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "bill_reconcile_duration_seconds",
        "Reconciliation engine run duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .expect("Failed to register reconcile_duration")
});

/// Automatic matches by field and strategy.
pub static MATCHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bill_matches_total",
        "Total number of automatic matches by field and strategy",
        &["field", "strategy"]
    )
    .expect("Failed to register matches_total")
});

/// Verification attempts by outcome.
pub static VERIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bill_verifications_total",
        "Total number of verification attempts by outcome",
        &["outcome"] // success, failure, noop
    )
    .expect("Failed to register verifications_total")
});

/// Sync attempts by outcome.
pub static SYNCS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bill_syncs_total",
        "Total number of sync attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to register syncs_total")
});

/// Gateway call duration by operation.
pub static GATEWAY_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "bill_gateway_call_duration_seconds",
        "External gateway call duration in seconds",
        &["operation"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register gateway_call_duration")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "bill_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&RECONCILE_DURATION);
    Lazy::force(&MATCHES_TOTAL);
    Lazy::force(&VERIFICATIONS_TOTAL);
    Lazy::force(&SYNCS_TOTAL);
    Lazy::force(&GATEWAY_CALL_DURATION);
    Lazy::force(&ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
