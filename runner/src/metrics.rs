//! Runner metrics
//!
//! Test outcomes and operation durations, exposed in Prometheus text format.

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Runner metrics registry
    pub static ref RUNNER_METRICS_REGISTRY: Registry = Registry::new();

    /// Completed test instances by outcome
    #[allow(clippy::expect_used)]
    static ref TEST_OUTCOMES_TOTAL: IntCounterVec = {
        let opts = Opts::new(
            "ketju_test_outcomes_total",
            "Total number of completed test instances by outcome",
        );
        let counter = IntCounterVec::new(opts, &["result"])
            .expect("Failed to create counter");
        if let Err(e) = RUNNER_METRICS_REGISTRY.register(Box::new(counter.clone())) {
            tracing::warn!("Failed to register ketju_test_outcomes_total: {}", e);
        }
        counter
    };

    /// Operation execution duration
    #[allow(clippy::expect_used)]
    static ref OPERATION_DURATION: HistogramVec = {
        let opts = HistogramOpts::new(
            "ketju_operation_duration_seconds",
            "Operation execution duration in seconds",
        );
        let histogram = HistogramVec::new(opts, &["operation", "result"])
            .expect("Failed to create histogram");
        if let Err(e) = RUNNER_METRICS_REGISTRY.register(Box::new(histogram.clone())) {
            tracing::warn!("Failed to register ketju_operation_duration_seconds: {}", e);
        }
        histogram
    };
}

/// Record a completed test instance ("passed", "failed" or "skipped")
pub fn record_test_outcome(result: &str) {
    TEST_OUTCOMES_TOTAL.with_label_values(&[result]).inc();
}

/// Record an executed operation
pub fn record_operation(operation: &str, duration_secs: f64, result: &str) {
    OPERATION_DURATION
        .with_label_values(&[operation, result])
        .observe(duration_secs);
}

/// Gather runner metrics
pub fn gather_runner_metrics() -> Result<String, String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = RUNNER_METRICS_REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert to UTF-8: {}", e))
}
