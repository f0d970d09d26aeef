//! Metrics module for billing-service.
//! Prometheus metrics for store queries and billing runs.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "billing_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Billing runs counter
pub static BILLING_RUNS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Invoices generated counter
pub static INVOICES_GENERATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    BILLING_RUNS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_runs_total",
                "Total billing runs by trigger type and final status"
            ),
            &["run_type", "status"]
        )
        .expect("Failed to register BILLING_RUNS_TOTAL")
    });

    INVOICES_GENERATED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "billing_invoices_generated_total",
                "Total monthly invoices generated by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register INVOICES_GENERATED_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("billing_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a billing run.
pub fn record_billing_run(run_type: &str, status: &str) {
    if let Some(counter) = BILLING_RUNS_TOTAL.get() {
        counter.with_label_values(&[run_type, status]).inc();
    }
}

/// Record invoice-generation outcomes for one run.
pub fn record_invoices_generated(outcome: &str, count: u64) {
    if let Some(counter) = INVOICES_GENERATED_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc_by(count);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
