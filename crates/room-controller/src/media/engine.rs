//! Contract consumed from the external media engine.
//!
//! The engine owns worker processes and everything created on them. This layer
//! only creates objects, closes them, and watches worker liveness. All handles
//! are shared (`Arc<dyn …>`) because the registry and the signaling layer both
//! hold them while a call is in flight.
//!
//! `close()` is idempotent on every object: closing an already-closed object
//! is a no-op on the engine side. It may still report an error when the hosting
//! worker is gone; callers decide whether that matters.

use crate::media::codecs::{MediaKind, RtpCodecCapability};
use crate::media::settings::{ConsumeOptions, ProduceOptions, WebRtcTransportOptions, WorkerSettings};
use crate::types::{ConsumerId, ProducerId, RouterId, TransportId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the media engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// Spawning a worker process failed.
    #[error("Worker spawn failed: {0}")]
    WorkerSpawn(String),

    /// The hosting worker process has exited.
    #[error("Worker closed: {0}")]
    WorkerClosed(String),

    /// Creating a router, transport, producer or consumer failed.
    #[error("Create failed: {0}")]
    Create(String),

    /// Closing an object failed.
    #[error("Close failed: {0}")]
    Close(String),

    /// The engine rejected the request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Entry point into the media engine: spawns worker processes.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn create_worker(
        &self,
        settings: &WorkerSettings,
    ) -> Result<Arc<dyn MediaWorker>, MediaError>;
}

/// One media worker process.
#[async_trait]
pub trait MediaWorker: Send + Sync {
    /// OS process id of the worker.
    fn pid(&self) -> u32;

    async fn create_router(
        &self,
        media_codecs: &[RtpCodecCapability],
    ) -> Result<Arc<dyn MediaRouter>, MediaError>;

    /// Resolves once the worker process has died.
    ///
    /// Never resolves for a healthy worker. Multiple callers may await it.
    async fn died(&self);
}

/// Per-room routing context, created on exactly one worker.
#[async_trait]
pub trait MediaRouter: Send + Sync {
    fn id(&self) -> RouterId;

    fn closed(&self) -> bool;

    async fn create_webrtc_transport(
        &self,
        options: &WebRtcTransportOptions,
    ) -> Result<Arc<dyn MediaTransport>, MediaError>;

    async fn close(&self) -> Result<(), MediaError>;
}

/// Network endpoint through which a participant sends or receives media.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    fn id(&self) -> TransportId;

    fn closed(&self) -> bool;

    async fn produce(&self, options: ProduceOptions) -> Result<Arc<dyn MediaProducer>, MediaError>;

    async fn consume(&self, options: ConsumeOptions) -> Result<Arc<dyn MediaConsumer>, MediaError>;

    async fn close(&self) -> Result<(), MediaError>;
}

/// Outbound media track.
#[async_trait]
pub trait MediaProducer: Send + Sync {
    fn id(&self) -> ProducerId;

    fn kind(&self) -> MediaKind;

    fn closed(&self) -> bool;

    async fn close(&self) -> Result<(), MediaError>;
}

/// Inbound media track fed by a producer.
#[async_trait]
pub trait MediaConsumer: Send + Sync {
    fn id(&self) -> ConsumerId;

    fn producer_id(&self) -> ProducerId;

    fn kind(&self) -> MediaKind;

    fn closed(&self) -> bool;

    async fn close(&self) -> Result<(), MediaError>;
}
