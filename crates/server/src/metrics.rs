//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus recorder initialization
//! - Metric descriptions
//! - Helpers the job layer records through
//! - Rendering for the `/metrics` endpoint

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup, before anything is recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!("jobs_started_total", "Retrieval jobs started, by quality tier");
    describe_counter!(
        "jobs_finished_total",
        "Retrieval jobs that reached a terminal state, by status"
    );
    describe_counter!(
        "progress_updates_dropped_total",
        "Progress updates dropped because a subscriber's queue was full"
    );
    describe_gauge!("progress_subscribers", "Open progress stream subscriptions");
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_job_started(tier: &str) {
    counter!("jobs_started_total", "tier" => tier.to_string()).increment(1);
}

pub fn record_job_finished(status: &str) {
    counter!("jobs_finished_total", "status" => status.to_string()).increment(1);
}

pub fn record_update_dropped() {
    counter!("progress_updates_dropped_total").increment(1);
}

/// Adjust the open-subscriber gauge by `delta`.
pub fn record_subscribers(delta: f64) {
    if delta >= 0.0 {
        gauge!("progress_subscribers").increment(delta);
    } else {
        gauge!("progress_subscribers").decrement(-delta);
    }
}
