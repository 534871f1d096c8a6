/// Metrics and telemetry for the resolver
///
/// Prometheus-compatible metrics for monitoring:
/// - DID resolutions by path and outcome
/// - Resolution latency
/// - Registry (Stacks node) requests by endpoint and status
/// - HTTP requests served

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== Resolution Metrics ==========

    /// DID resolutions by path (on-chain, off-chain, migrated) and outcome code
    pub static ref RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "did_resolutions_total",
        "Total number of did:stack:v2 resolutions",
        &["path", "outcome"]
    )
    .unwrap();

    /// End-to-end resolution duration in seconds
    pub static ref RESOLUTION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "did_resolution_duration_seconds",
        "did:stack:v2 resolution latencies in seconds",
        &["path"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========== Registry Metrics ==========

    /// Stacks node API requests by endpoint and status
    pub static ref REGISTRY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "registry_requests_total",
        "Total number of Stacks node API requests",
        &["endpoint", "status"]
    )
    .unwrap();

    // ========== HTTP Metrics ==========

    /// HTTP requests served, by route and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["route", "status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record a finished resolution
pub fn record_resolution(path: &str, outcome: &str, duration: f64) {
    RESOLUTIONS_TOTAL.with_label_values(&[path, outcome]).inc();
    RESOLUTION_DURATION_SECONDS
        .with_label_values(&[path])
        .observe(duration);
}

/// Record a Stacks node API request
pub fn record_registry_request(endpoint: &str, status: &str) {
    REGISTRY_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();
}

/// Record an HTTP request served by the driver
pub fn record_http_request(route: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[route, &status.to_string()])
        .inc();
}
