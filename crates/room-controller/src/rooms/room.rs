//! Room record and the read-only views handed to the signaling layer.

use crate::media::{MediaConsumer, MediaProducer, MediaRouter, MediaTransport};
use crate::types::{ConsumerId, ProducerId, RoomId, RouterId, SessionId, TransportId, WorkerId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

/// Participant state within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub session_id: SessionId,
    pub display_name: String,
    pub is_creator: bool,
    pub is_streaming_camera: bool,
    pub is_screen_sharing: bool,
    /// Connection dropped; the record stays until explicitly removed.
    pub disconnected: bool,
}

impl Participant {
    /// A freshly joined, connected participant.
    pub fn new(session_id: impl Into<SessionId>, display_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            display_name: display_name.into(),
            is_creator: false,
            is_streaming_camera: false,
            is_screen_sharing: false,
            disconnected: false,
        }
    }

    /// The participant who created the room.
    pub fn creator(session_id: impl Into<SessionId>, display_name: impl Into<String>) -> Self {
        Self {
            is_creator: true,
            ..Self::new(session_id, display_name)
        }
    }
}

/// One entry of a room's chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender_session_id: SessionId,
    pub sender_name: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        sender_session_id: impl Into<SessionId>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_session_id: sender_session_id.into(),
            sender_name: sender_name.into(),
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Point-in-time copy of a room, safe to hold without the registry lock.
///
/// Object id lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub display_name: String,
    pub owner_worker_id: WorkerId,
    pub router_id: RouterId,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    pub transport_ids: Vec<TransportId>,
    pub producer_ids: Vec<ProducerId>,
    pub consumer_ids: Vec<ConsumerId>,
    pub chat_history: Vec<ChatMessage>,
}

impl RoomSnapshot {
    /// Participants still connected.
    pub fn connected_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.disconnected)
    }

    #[must_use]
    pub fn participant(&self, session_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.session_id == session_id)
    }
}

/// Registry-owned room state.
///
/// Only the registry touches these collections; every id in `transports`,
/// `producers` and `consumers` is mirrored in the matching reverse index.
pub(crate) struct Room {
    pub(crate) id: RoomId,
    pub(crate) display_name: String,
    pub(crate) owner_worker_id: WorkerId,
    pub(crate) router: Arc<dyn MediaRouter>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) participants: Vec<Participant>,
    pub(crate) transports: HashMap<TransportId, Arc<dyn MediaTransport>>,
    pub(crate) producers: HashMap<ProducerId, Arc<dyn MediaProducer>>,
    pub(crate) consumers: HashMap<ConsumerId, Arc<dyn MediaConsumer>>,
    pub(crate) chat_history: VecDeque<ChatMessage>,
    /// Teardown in progress: no new objects accepted.
    pub(crate) closing: bool,
    /// Flips to true once the room has left the registry.
    pub(crate) torn_down: watch::Sender<bool>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        display_name: String,
        owner_worker_id: WorkerId,
        router: Arc<dyn MediaRouter>,
        creator: Participant,
    ) -> Self {
        Self {
            id,
            display_name,
            owner_worker_id,
            router,
            created_at: Utc::now(),
            participants: vec![creator],
            transports: HashMap::new(),
            producers: HashMap::new(),
            consumers: HashMap::new(),
            chat_history: VecDeque::new(),
            closing: false,
            torn_down: watch::channel(false).0,
        }
    }

    pub(crate) fn participant_mut(&mut self, session_id: &str) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.session_id == session_id)
    }

    /// Append a chat message, evicting the oldest entries beyond `limit`.
    pub(crate) fn push_chat_message(&mut self, message: ChatMessage, limit: usize) {
        self.chat_history.push_back(message);
        while self.chat_history.len() > limit {
            self.chat_history.pop_front();
        }
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            owner_worker_id: self.owner_worker_id,
            router_id: self.router.id(),
            created_at: self.created_at,
            participants: self.participants.clone(),
            transport_ids: sorted_keys(&self.transports),
            producer_ids: sorted_keys(&self.producers),
            consumer_ids: sorted_keys(&self.consumers),
            chat_history: self.chat_history.iter().cloned().collect(),
        }
    }
}

fn sorted_keys<K: Ord + Clone, V>(map: &HashMap<K, V>) -> Vec<K> {
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort();
    keys
}
