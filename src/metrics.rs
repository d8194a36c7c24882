// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for domain manager runs.
//!
//! Every metric uses the namespace prefix `domain_manager_`. A run is a short
//! batch job, so instead of serving `/metrics` the registry is encoded once at
//! the end of the run and written to a textfile (see `--metrics-file`).
//!
//! # Metrics
//!
//! - `domain_manager_domain_operations_total{operation, outcome}` - one sample per domain and lifecycle operation
//! - `domain_manager_throttle_retries_total{operation}` - throttled steps that were retried
//! - `domain_manager_run_duration_seconds{operation}` - duration of whole lifecycle operations
//!
//! # Example
//!
//! ```rust,no_run
//! use domain_manager::metrics::{gather_metrics, record_domain_outcome};
//!
//! record_domain_outcome("create-domains", "succeeded");
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("domain_manager_domain_operations_total"));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::warn;

/// Namespace prefix for all domain manager metrics
const METRICS_NAMESPACE: &str = "domain_manager";

/// Registry and metric families of the process.
pub struct DomainMetrics {
    pub registry: Registry,

    /// Per-domain outcomes
    ///
    /// Labels:
    /// - `operation`: lifecycle operation (`create-domains`, `sync-mappings`, ...)
    /// - `outcome`: `succeeded`, `skipped` or `failed`
    pub domain_operations_total: CounterVec,

    /// Throttled steps that were retried
    ///
    /// Labels:
    /// - `operation`: the throttled step (e.g. `create domain api.example.com`)
    pub throttle_retries_total: CounterVec,

    /// Duration of lifecycle operations in seconds
    ///
    /// Labels:
    /// - `operation`: lifecycle operation
    pub run_duration_seconds: HistogramVec,
}

impl DomainMetrics {
    /// Create and register every metric family in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric definition is rejected by the registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let domain_operations_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_domain_operations_total"),
                "Total number of domain outcomes by lifecycle operation and outcome",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(domain_operations_total.clone()))?;

        let throttle_retries_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_throttle_retries_total"),
                "Total number of throttled steps retried after backoff",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(throttle_retries_total.clone()))?;

        let run_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                format!("{METRICS_NAMESPACE}_run_duration_seconds"),
                "Duration of lifecycle operations in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
            &["operation"],
        )?;
        registry.register(Box::new(run_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            domain_operations_total,
            throttle_retries_total,
            run_duration_seconds,
        })
    }
}

/// Global metrics, `None` if registration failed.
///
/// A registration failure only disables metrics; it never fails a run.
pub static METRICS: LazyLock<Option<DomainMetrics>> = LazyLock::new(|| match DomainMetrics::new() {
    Ok(metrics) => Some(metrics),
    Err(e) => {
        warn!(error = %e, "Failed to register metrics, metrics are disabled");
        None
    }
});

/// Record the outcome of one domain for a lifecycle operation
///
/// # Arguments
/// * `operation` - Lifecycle operation name
/// * `outcome` - `succeeded`, `skipped` or `failed`
pub fn record_domain_outcome(operation: &str, outcome: &str) {
    if let Some(metrics) = METRICS.as_ref() {
        metrics
            .domain_operations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }
}

/// Record that a throttled step is about to be retried
pub fn record_throttle_retry(operation: &str) {
    if let Some(metrics) = METRICS.as_ref() {
        metrics
            .throttle_retries_total
            .with_label_values(&[operation])
            .inc();
    }
}

/// Record the duration of a whole lifecycle operation
pub fn record_run_duration(operation: &str, duration: Duration) {
    if let Some(metrics) = METRICS.as_ref() {
        metrics
            .run_duration_seconds
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String, empty if metrics are disabled
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let Some(metrics) = METRICS.as_ref() else {
        return Ok(String::new());
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
