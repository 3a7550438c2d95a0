//! Prometheus metrics for crudbox.
//!
//! Tracks mock traffic, OpenAPI import classification and commit outcomes.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};
use tracing::error;

lazy_static! {
    /// Mock requests by outcome
    pub static ref MOCK_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "crudbox_mock_requests_total",
        "Total number of requests handled by the mock listener",
        &["outcome"]  // outcome: matched|project_not_found|route_not_found|error
    )
    .unwrap();

    /// Mock request duration
    pub static ref MOCK_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "crudbox_mock_request_duration_ms",
        "Time to resolve and render a mock response in milliseconds",
        &["outcome"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 100.0]
    )
    .unwrap();

    /// Preview classifications
    pub static ref IMPORT_OPERATIONS_TOTAL: CounterVec = register_counter_vec!(
        "crudbox_import_operations_total",
        "Operations classified by OpenAPI import previews",
        &["classification"]  // classification: new|existing|duplicate
    )
    .unwrap();

    /// Commit outcomes per candidate
    pub static ref COMMIT_ENDPOINTS_TOTAL: CounterVec = register_counter_vec!(
        "crudbox_commit_endpoints_total",
        "Endpoints processed by import commits",
        &["result"]  // result: created|skipped|not_attempted
    )
    .unwrap();

    /// Live projects
    pub static ref PROJECTS_TOTAL: IntGauge = register_int_gauge!(
        "crudbox_projects_total",
        "Number of projects currently stored"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record a served mock request
pub fn record_mock_request(outcome: &str, duration_ms: f64) {
    MOCK_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    MOCK_REQUEST_DURATION_MS
        .with_label_values(&[outcome])
        .observe(duration_ms);
}

/// Helper to record preview classifications
pub fn record_import_classification(classification: &str, count: usize) {
    IMPORT_OPERATIONS_TOTAL
        .with_label_values(&[classification])
        .inc_by(count as f64);
}

/// Helper to record commit results
pub fn record_commit(result: &str, count: usize) {
    COMMIT_ENDPOINTS_TOTAL
        .with_label_values(&[result])
        .inc_by(count as f64);
}

pub fn set_projects_total(count: usize) {
    PROJECTS_TOTAL.set(count as i64);
}
