//! Room Controller Library
//!
//! This library maps video-conferencing rooms onto a fixed pool of media
//! worker processes and keeps track of every media object each room owns:
//!
//! - Round-robin assignment of media workers to new rooms
//! - Worker death detection, room termination and worker replacement
//! - Room registry with reverse lookup from any transport, producer or
//!   consumer id to its room
//! - Ordered teardown (consumers, producers, transports, router)
//!
//! # Architecture
//!
//! ```text
//! RoomController (one per instance)
//! ├── WorkerPool
//! │   └── N media workers (watched for death, replaced after a backoff)
//! ├── RoomRegistry
//! │   └── Room (one per meeting, pinned to one worker)
//! │       ├── router
//! │       └── transports / producers / consumers (+ reverse indexes)
//! └── death listener (WorkerPool death channel → RoomRegistry)
//! ```
//!
//! The media engine itself sits behind the traits in [`media`]; the signaling
//! layer drives the registry and receives interrupted-room notices through a
//! [`rooms::RoomEventSink`].
//!
//! # Modules
//!
//! - [`config`] - Configuration from environment
//! - [`controller`] - Instance wiring and graceful shutdown
//! - [`errors`] - Error types with signaling error codes
//! - [`media`] - Media engine contract, codecs and settings
//! - [`observability`] - Metrics and health endpoints
//! - [`rooms`] - Room registry
//! - [`workers`] - Worker pool

pub mod config;
pub mod controller;
pub mod errors;
pub mod media;
pub mod observability;
pub mod rooms;
pub mod types;
pub mod workers;

pub use controller::{ControllerStatus, RoomController};
pub use errors::RcError;
