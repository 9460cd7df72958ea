//! Pre-configured test data fixtures for Room Controller testing.
//!
//! Provides:
//! - Configurations with small pools and short backoffs
//! - Rooms with creator details
//! - A sink recording interrupted rooms
//! - A helper that opens one transport, producer and consumer in a room
//! - Log output for tests, filtered by `RUST_LOG`

use room_controller::config::Config;
use room_controller::media::{ConsumeOptions, MediaKind, ProduceOptions, WebRtcTransportOptions};
use room_controller::rooms::{RoomEventSink, RoomRegistry, RoomSnapshot};
use room_controller::types::{ConsumerId, ProducerId, RoomId, TransportId};
use room_controller::RcError;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Replacement backoff used by [`test_config`].
pub const TEST_REPLACEMENT_BACKOFF_MS: u64 = 500;

/// Chat history bound used by [`test_config`].
pub const TEST_CHAT_HISTORY_LIMIT: usize = 5;

/// Install a test log subscriber once per test binary.
///
/// Defaults to `warn` when `RUST_LOG` is unset.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Environment variables for a test configuration.
#[must_use]
pub fn test_vars(worker_count: usize) -> HashMap<String, String> {
    HashMap::from([
        ("RC_ID".to_string(), "rc-test".to_string()),
        ("RC_WORKER_COUNT".to_string(), worker_count.to_string()),
        (
            "RC_WORKER_REPLACEMENT_BACKOFF_MS".to_string(),
            TEST_REPLACEMENT_BACKOFF_MS.to_string(),
        ),
        (
            "RC_CHAT_HISTORY_LIMIT".to_string(),
            TEST_CHAT_HISTORY_LIMIT.to_string(),
        ),
    ])
}

/// A valid configuration with `worker_count` workers.
#[must_use]
pub fn test_config(worker_count: usize) -> Config {
    Config::from_vars(&test_vars(worker_count)).expect("test config should be valid")
}

/// Test room fixture.
#[derive(Debug, Clone)]
pub struct TestRoom {
    pub id: RoomId,
    pub display_name: String,
    pub creator_name: String,
    pub creator_session_id: String,
}

impl TestRoom {
    /// Create a new test room with the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(id),
            display_name: "Test Room".to_string(),
            creator_name: "Alice".to_string(),
            creator_session_id: "session-alice".to_string(),
        }
    }

    /// Create a test room with a random ID.
    #[must_use]
    pub fn random() -> Self {
        Self::new(format!("room-{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn with_creator(mut self, name: impl Into<String>, session_id: impl Into<String>) -> Self {
        self.creator_name = name.into();
        self.creator_session_id = session_id.into();
        self
    }

    /// Create this room in `registry`.
    pub async fn create_in(&self, registry: &RoomRegistry) -> Result<RoomSnapshot, RcError> {
        registry
            .create_room(
                self.id.clone(),
                self.display_name.clone(),
                self.creator_name.clone(),
                self.creator_session_id.clone(),
            )
            .await
    }
}

/// Ids of the media objects opened by [`open_media`].
#[derive(Debug, Clone)]
pub struct RoomMedia {
    pub transport_id: TransportId,
    pub producer_id: ProducerId,
    pub consumer_id: ConsumerId,
}

/// Open and register one transport, one producer on it and one consumer of
/// that producer, the way the signaling layer does.
pub async fn open_media(registry: &RoomRegistry, room_id: &RoomId) -> RoomMedia {
    let router = registry.router(room_id).await.expect("room should be open");

    let transport = router
        .create_webrtc_transport(&WebRtcTransportOptions::default())
        .await
        .expect("transport creation");
    let transport_id = transport.id();
    assert!(registry.add_transport(room_id, transport).await);

    let transport = registry
        .transport(&transport_id)
        .await
        .expect("registered transport");

    let producer = transport
        .produce(ProduceOptions {
            kind: MediaKind::Video,
            rtp_parameters: serde_json::json!({ "mid": "0" }),
        })
        .await
        .expect("produce");
    let producer_id = producer.id();
    assert!(registry.add_producer(room_id, producer).await);

    let consumer = transport
        .consume(ConsumeOptions {
            producer_id: producer_id.clone(),
            rtp_capabilities: serde_json::json!({ "kind": "video" }),
            paused: true,
        })
        .await
        .expect("consume");
    let consumer_id = consumer.id();
    assert!(registry.add_consumer(room_id, consumer).await);

    RoomMedia {
        transport_id,
        producer_id,
        consumer_id,
    }
}

/// Sink recording every interrupted room it is told about.
#[derive(Debug, Default)]
pub struct RecordingSink {
    rooms: Mutex<Vec<RoomSnapshot>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the interrupted rooms, in notification order.
    #[must_use]
    pub fn interrupted_ids(&self) -> Vec<RoomId> {
        self.rooms
            .lock()
            .unwrap()
            .iter()
            .map(|room| room.id.clone())
            .collect()
    }

    #[must_use]
    pub fn interrupted(&self) -> Vec<RoomSnapshot> {
        self.rooms.lock().unwrap().clone()
    }
}

impl RoomEventSink for RecordingSink {
    fn room_interrupted(&self, room: &RoomSnapshot) {
        self.rooms.lock().unwrap().push(room.clone());
    }
}
