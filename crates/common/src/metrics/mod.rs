//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all VoiceNotes metrics
pub const METRICS_PREFIX: &str = "voicenotes";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Buckets for summary backend latency (bounded by the 15s backend timeout)
pub const SUMMARY_BUCKETS: &[f64] = &[
    0.0001, // 0.1ms - extractive
    0.001,  // 1ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s - secondary timeout
    15.00,  // 15s - primary timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Summarizer metrics
    describe_counter!(
        format!("{}_summary_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Summary attempts per backend and outcome"
    );

    describe_histogram!(
        format!("{}_summary_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Summary backend latency in seconds"
    );

    // Note metrics
    describe_counter!(
        format!("{}_note_operations_total", METRICS_PREFIX),
        Unit::Count,
        "Note operations by kind"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one tier of the summary chain
pub fn record_summary_attempt(backend: &str, outcome: &str, duration_secs: f64) {
    counter!(
        format!("{}_summary_attempts_total", METRICS_PREFIX),
        "backend" => backend.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_summary_duration_seconds", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .record(duration_secs);
}

/// Record a note mutation (create, update, delete, summarize)
pub fn record_note_operation(operation: &'static str) {
    counter!(
        format!("{}_note_operations_total", METRICS_PREFIX),
        "operation" => operation
    )
    .increment(1);
}
