//! Health endpoints for the Room Controller.
//!
//! Provides Kubernetes-compatible health endpoints:
//! - `GET /health` - Liveness probe (is the process running?)
//! - `GET /ready` - Readiness probe (can we host new rooms?)
//!
//! The embedding service mounts [`health_router`] next to its own routes.
//! The `/metrics` endpoint is served separately via `metrics-exporter-prometheus`.
//!
//! # Health State
//!
//! The `HealthState` tracks:
//! - `live`: Always true after startup (process is running)
//! - `workers`: Current worker pool size, kept in sync by the pool
//! - `draining`: Set once shutdown begins
//!
//! The service is ready while at least one worker is available and it is not
//! draining.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Health state for the Room Controller.
#[derive(Debug)]
pub struct HealthState {
    live: AtomicBool,
    workers: AtomicUsize,
    draining: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (live, no workers, not draining).
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            workers: AtomicUsize::new(0),
            draining: AtomicBool::new(false),
        }
    }

    /// Record the current worker pool size.
    pub fn set_worker_count(&self, count: usize) {
        self.workers.store(count, Ordering::SeqCst);
    }

    /// Mark the service as draining (shutdown in progress).
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Ready when at least one worker is available and not draining.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.worker_count() > 0 && !self.draining.load(Ordering::SeqCst)
    }
}

/// Create the health router with liveness and readiness endpoints.
///
/// # Endpoints
///
/// - `GET /health` - Returns 200 if process is running (liveness)
/// - `GET /ready` - Returns 200 if rooms can be hosted, 503 otherwise (readiness)
pub fn health_router(health_state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .with_state(health_state)
}

async fn liveness_handler(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_live() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn readiness_handler(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
