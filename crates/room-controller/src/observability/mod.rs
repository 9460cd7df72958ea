//! Observability module for the Room Controller.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `rc_workers_active` | Gauge | none | Current worker pool size |
//! | `rc_rooms_active` | Gauge | none | Registered rooms |
//! | `rc_media_objects_active` | Gauge | `kind` | Registered transports/producers/consumers |
//! | `rc_worker_deaths_total` | Counter | none | Worker process deaths |
//! | `rc_worker_replacements_total` | Counter | `status` | Replacement spawn outcomes |
//! | `rc_rooms_interrupted_total` | Counter | none | Rooms ended by worker death |
//! | `rc_media_close_failures_total` | Counter | `kind` | Engine close calls that failed |
//! | `rc_room_teardown_duration_seconds` | Histogram | none | Full room teardown time |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::init_metrics_recorder;
