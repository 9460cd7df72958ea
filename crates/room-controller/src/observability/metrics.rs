//! Metrics definitions for the Room Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rc_` prefix for Room Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: 3 values (transport, producer, consumer)
//! - `status`: 2 values (success, error)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Room teardown waits on one engine close call per object
        .set_buckets_for_metric(
            Matcher::Prefix("rc_room_teardown".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set room teardown buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Pool & Registry Gauges
// ============================================================================

/// Set the number of workers currently in the pool.
///
/// Metric: `rc_workers_active`
pub fn set_workers_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_workers_active").set(count as f64);
}

/// Set the number of registered rooms.
///
/// Metric: `rc_rooms_active`
pub fn set_rooms_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_rooms_active").set(count as f64);
}

/// Set the number of registered media objects of one kind.
///
/// Metric: `rc_media_objects_active`
/// Labels: `kind` (transport, producer, consumer)
pub fn set_media_objects_active(kind: &'static str, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_media_objects_active", "kind" => kind).set(count as f64);
}

// ============================================================================
// Worker Lifecycle Counters
// ============================================================================

/// Record a worker death.
///
/// Metric: `rc_worker_deaths_total`
pub fn record_worker_death() {
    counter!("rc_worker_deaths_total").increment(1);
}

/// Record the outcome of a replacement worker spawn.
///
/// Metric: `rc_worker_replacements_total`
/// Labels: `status` (success, error)
pub fn record_worker_replacement(status: &'static str) {
    counter!("rc_worker_replacements_total", "status" => status).increment(1);
}

// ============================================================================
// Room Lifecycle
// ============================================================================

/// Record a room torn down because its worker died.
///
/// Metric: `rc_rooms_interrupted_total`
pub fn record_room_interrupted() {
    counter!("rc_rooms_interrupted_total").increment(1);
}

/// Record a media object whose engine-side close failed.
///
/// Metric: `rc_media_close_failures_total`
/// Labels: `kind` (router, transport, producer, consumer)
pub fn record_media_close_failure(kind: &'static str) {
    counter!("rc_media_close_failures_total", "kind" => kind).increment(1);
}

/// Record full room teardown duration.
///
/// Metric: `rc_room_teardown_duration_seconds`
pub fn record_room_teardown(duration: Duration) {
    histogram!("rc_room_teardown_duration_seconds").record(duration.as_secs_f64());
}
