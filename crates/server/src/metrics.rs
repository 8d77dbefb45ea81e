// crates/server/src/metrics.rs
//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms)
//! - Helper functions for recording job outcomes
//! - The render half of the `/metrics` endpoint

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at application startup, before any metrics are recorded.
/// Idempotent: concurrent and repeated calls all observe a usable handle;
/// only the first returns `true`.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Failed to set global metrics recorder (already set)");
        }

        describe_metrics();
        installed = true;
        tracing::info!("Prometheus metrics initialized");
        handle
    });
    installed
}

/// Describe all application metrics for Prometheus.
fn describe_metrics() {
    describe_counter!(
        "querydeck_jobs_submitted_total",
        "Total number of query jobs accepted via sql/submit"
    );
    describe_counter!(
        "querydeck_jobs_finished_total",
        "Query jobs per terminal state (complete, failed, timeout, cancelled)"
    );
    describe_histogram!(
        "querydeck_query_duration_seconds",
        "Wall-clock duration of backend query calls, labeled by outcome"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a newly accepted query job.
pub fn record_job_submitted() {
    counter!("querydeck_jobs_submitted_total").increment(1);
}

/// Record a job reaching a terminal state.
///
/// `duration` is the backend call's wall-clock time when one was made; an
/// explicit cancel of a pending job has none.
pub fn record_job_finished(status: &str, duration: Option<Duration>) {
    counter!("querydeck_jobs_finished_total", "status" => status.to_string()).increment(1);
    if let Some(duration) = duration {
        histogram!("querydeck_query_duration_seconds", "status" => status.to_string())
            .record(duration.as_secs_f64());
    }
}
