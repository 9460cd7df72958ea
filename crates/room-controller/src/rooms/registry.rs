//! `RoomRegistry` - rooms and the media objects they own.
//!
//! Every transport, producer and consumer id lives in two places at once: its
//! room's collection and a global reverse index mapping the id back to the
//! room. Both are mutated under the same lock acquisition, so the two views
//! never disagree.
//!
//! # Teardown Order
//!
//! `remove_room` closes consumers, then producers, then transports, then the
//! router. Each object leaves its collection and reverse index right after its
//! close call returns. A failed close is logged and counted, never retried, and
//! never stops the teardown.
//!
//! # Locking
//!
//! Registry state sits behind one `tokio::sync::Mutex`. The lock is never held
//! across a media engine call. It is held across a pool lookup, so the lock
//! order is registry, then pool.
//!
//! # Closing Rooms
//!
//! A room being torn down stays registered until its last close call returns.
//! Anyone else asking to remove it waits on the room's `torn_down` signal, so
//! `remove_room` and `handle_worker_death` never return while the room or its
//! media ids are still indexed.

use crate::config::Config;
use crate::errors::RcError;
use crate::media::{
    MediaConsumer, MediaError, MediaProducer, MediaRouter, MediaTransport, RtpCodecCapability,
};
use crate::observability::metrics;
use crate::rooms::room::{ChatMessage, Participant, Room, RoomSnapshot};
use crate::types::{ConsumerId, ProducerId, RoomId, SessionId, TransportId, WorkerId};
use crate::workers::WorkerPool;

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

/// Receives rooms ended by a worker death, before they are torn down.
pub trait RoomEventSink: Send + Sync {
    fn room_interrupted(&self, room: &RoomSnapshot);
}

impl<F> RoomEventSink for F
where
    F: Fn(&RoomSnapshot) + Send + Sync,
{
    fn room_interrupted(&self, room: &RoomSnapshot) {
        self(room);
    }
}

/// Registry parameters taken from [`Config`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub media_codecs: Vec<RtpCodecCapability>,
    pub chat_history_limit: usize,
}

impl From<&Config> for RegistryConfig {
    fn from(config: &Config) -> Self {
        Self {
            media_codecs: config.media_codecs.clone(),
            chat_history_limit: config.chat_history_limit,
        }
    }
}

/// Object counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub transports: usize,
    pub producers: usize,
    pub consumers: usize,
}

struct RegistryState {
    rooms: HashMap<RoomId, Room>,
    transport_index: HashMap<TransportId, RoomId>,
    producer_index: HashMap<ProducerId, RoomId>,
    consumer_index: HashMap<ConsumerId, RoomId>,
    accepting_new: bool,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            transport_index: HashMap::new(),
            producer_index: HashMap::new(),
            consumer_index: HashMap::new(),
            accepting_new: true,
        }
    }

    /// The room, unless it is missing or being torn down.
    fn open_room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id).filter(|room| !room.closing)
    }

    fn unregister_transport(&mut self, transport_id: &TransportId) {
        if let Some(room_id) = self.transport_index.remove(transport_id) {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.transports.remove(transport_id);
            }
        }
    }

    fn unregister_producer(&mut self, producer_id: &ProducerId) {
        if let Some(room_id) = self.producer_index.remove(producer_id) {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.producers.remove(producer_id);
            }
        }
    }

    fn unregister_consumer(&mut self, consumer_id: &ConsumerId) {
        if let Some(room_id) = self.consumer_index.remove(consumer_id) {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.consumers.remove(consumer_id);
            }
        }
    }

    fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms: self.rooms.len(),
            transports: self.transport_index.len(),
            producers: self.producer_index.len(),
            consumers: self.consumer_index.len(),
        }
    }

    fn publish_gauges(&self) {
        let stats = self.stats();
        metrics::set_rooms_active(stats.rooms);
        metrics::set_media_objects_active("transport", stats.transports);
        metrics::set_media_objects_active("producer", stats.producers);
        metrics::set_media_objects_active("consumer", stats.consumers);
    }
}

/// The room registry.
pub struct RoomRegistry {
    pool: Arc<WorkerPool>,
    config: RegistryConfig,
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    pub fn new(pool: Arc<WorkerPool>, config: RegistryConfig) -> Self {
        Self {
            pool,
            config,
            state: Mutex::new(RegistryState::new()),
        }
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Create a room on the next worker in rotation.
    ///
    /// The creator becomes the first participant. Nothing is registered if
    /// router creation fails.
    ///
    /// # Errors
    ///
    /// - `RcError::IdAlreadyExists` - `room_id` is taken
    /// - `RcError::Draining` - the registry no longer accepts rooms
    /// - `RcError::NoWorkersAvailable` - the pool is empty
    /// - `RcError::MediaEngine` - router creation failed, or the worker died
    ///   while the router was being created
    #[instrument(skip_all, name = "rc.registry.create_room", fields(room_id = %room_id))]
    pub async fn create_room(
        &self,
        room_id: RoomId,
        display_name: impl Into<String>,
        creator_name: impl Into<String>,
        creator_session_id: impl Into<SessionId>,
    ) -> Result<RoomSnapshot, RcError> {
        {
            let state = self.state.lock().await;
            if !state.accepting_new {
                return Err(RcError::Draining);
            }
            if state.rooms.contains_key(&room_id) {
                return Err(RcError::IdAlreadyExists(room_id));
            }
        }

        let worker = self.pool.select_worker().await?;
        let router = worker
            .handle()
            .create_router(&self.config.media_codecs)
            .await
            .map_err(|e| {
                warn!(
                    target: "rc.registry",
                    room_id = %room_id,
                    worker_id = %worker.id(),
                    error = %e,
                    "Router creation failed"
                );
                RcError::from(e)
            })?;

        let mut state = self.state.lock().await;

        // Re-check: the lock was released while the router was created. A
        // worker leaves the pool before its death scan can take this lock, so
        // a worker still in the pool here will have this room in its scan.
        let rejection = if !state.accepting_new {
            Some(RcError::Draining)
        } else if state.rooms.contains_key(&room_id) {
            Some(RcError::IdAlreadyExists(room_id.clone()))
        } else if !self.pool.contains(worker.id()).await {
            Some(RcError::MediaEngine(MediaError::WorkerClosed(format!(
                "worker {} died during room creation",
                worker.id()
            ))))
        } else {
            None
        };

        if let Some(err) = rejection {
            drop(state);
            warn!(
                target: "rc.registry",
                room_id = %room_id,
                worker_id = %worker.id(),
                error = %err,
                "Room creation rolled back"
            );
            let _ = close_logged("router", router.id().as_str(), &room_id, router.close()).await;
            return Err(err);
        }

        let room = Room::new(
            room_id.clone(),
            display_name.into(),
            worker.id(),
            router,
            Participant::creator(creator_session_id, creator_name),
        );
        let snapshot = room.snapshot();
        state.rooms.insert(room_id.clone(), room);
        state.publish_gauges();
        let room_count = state.rooms.len();
        drop(state);

        info!(
            target: "rc.registry",
            room_id = %room_id,
            worker_id = %worker.id(),
            router_id = %snapshot.router_id,
            room_count,
            "Room created"
        );

        Ok(snapshot)
    }

    pub async fn get_room(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        self.state.lock().await.rooms.get(room_id).map(Room::snapshot)
    }

    /// True for registered rooms, including rooms being torn down.
    pub async fn has_room(&self, room_id: &RoomId) -> bool {
        self.state.lock().await.rooms.contains_key(room_id)
    }

    /// Snapshots of every room, oldest first.
    pub async fn get_all_rooms(&self) -> Vec<RoomSnapshot> {
        let mut rooms: Vec<RoomSnapshot> = self
            .state
            .lock()
            .await
            .rooms
            .values()
            .map(Room::snapshot)
            .collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rooms
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.state.lock().await.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        self.state.lock().await.stats()
    }

    /// The room's router, for creating transports. `None` once teardown began.
    pub async fn router(&self, room_id: &RoomId) -> Option<Arc<dyn MediaRouter>> {
        self.state
            .lock()
            .await
            .open_room_mut(room_id)
            .map(|room| Arc::clone(&room.router))
    }

    /// Tear a room down: consumers, producers, transports, then the router.
    ///
    /// No-op for an unknown room. If another caller is already tearing the
    /// room down, waits until that teardown has finished.
    #[instrument(skip_all, name = "rc.registry.remove_room", fields(room_id = %room_id))]
    pub async fn remove_room(&self, room_id: &RoomId) {
        let started = Instant::now();

        let (consumers, producers, transports, router) = {
            let mut state = self.state.lock().await;
            let Some(room) = state.rooms.get_mut(room_id) else {
                debug!(target: "rc.registry", room_id = %room_id, "Remove of unknown room ignored");
                return;
            };
            if room.closing {
                let torn_down = room.torn_down.subscribe();
                drop(state);
                debug!(target: "rc.registry", room_id = %room_id, "Waiting for teardown in progress");
                wait_torn_down(torn_down).await;
                return;
            }
            room.closing = true;
            (
                room.consumers.values().cloned().collect::<Vec<_>>(),
                room.producers.values().cloned().collect::<Vec<_>>(),
                room.transports.values().cloned().collect::<Vec<_>>(),
                Arc::clone(&room.router),
            )
        };

        let mut failures = 0usize;

        for consumer in consumers {
            let id = consumer.id();
            if close_logged("consumer", id.as_str(), room_id, consumer.close())
                .await
                .is_err()
            {
                failures += 1;
            }
            self.state.lock().await.unregister_consumer(&id);
        }

        for producer in producers {
            let id = producer.id();
            if close_logged("producer", id.as_str(), room_id, producer.close())
                .await
                .is_err()
            {
                failures += 1;
            }
            self.state.lock().await.unregister_producer(&id);
        }

        for transport in transports {
            let id = transport.id();
            if close_logged("transport", id.as_str(), room_id, transport.close())
                .await
                .is_err()
            {
                failures += 1;
            }
            self.state.lock().await.unregister_transport(&id);
        }

        if !router.closed()
            && close_logged("router", router.id().as_str(), room_id, router.close())
                .await
                .is_err()
        {
            failures += 1;
        }

        let room_count = {
            let mut state = self.state.lock().await;
            if let Some(room) = state.rooms.remove(room_id) {
                room.torn_down.send_replace(true);
            }
            state.publish_gauges();
            state.rooms.len()
        };

        let elapsed = started.elapsed();
        metrics::record_room_teardown(elapsed);

        info!(
            target: "rc.registry",
            room_id = %room_id,
            failures,
            room_count,
            elapsed_ms = elapsed.as_millis(),
            "Room removed"
        );
    }

    /// Stop accepting new rooms. Existing rooms are untouched.
    pub async fn stop_accepting(&self) {
        self.state.lock().await.accepting_new = false;
    }

    /// Tear down every registered room.
    pub async fn remove_all_rooms(&self) {
        for room_id in self.room_ids().await {
            self.remove_room(&room_id).await;
        }
    }

    /// End every room hosted on a dead worker.
    ///
    /// Each affected room is reported to `sink` and then torn down. Rooms on
    /// the worker that are already being torn down are not reported again,
    /// but are waited for, so none of the worker's rooms remain once this
    /// returns. Returns the number of rooms ended here.
    #[instrument(skip_all, name = "rc.registry.handle_worker_death", fields(worker_id = %worker_id))]
    pub async fn handle_worker_death(&self, worker_id: WorkerId, sink: &dyn RoomEventSink) -> usize {
        let (mut affected, in_teardown) = {
            let state = self.state.lock().await;
            let mut affected: Vec<RoomSnapshot> = Vec::new();
            let mut in_teardown: Vec<watch::Receiver<bool>> = Vec::new();
            for room in state.rooms.values().filter(|room| room.owner_worker_id == worker_id) {
                if room.closing {
                    in_teardown.push(room.torn_down.subscribe());
                } else {
                    affected.push(room.snapshot());
                }
            }
            (affected, in_teardown)
        };
        affected.sort_by(|a, b| a.id.cmp(&b.id));

        warn!(
            target: "rc.registry",
            worker_id = %worker_id,
            affected_rooms = affected.len(),
            rooms_in_teardown = in_teardown.len(),
            "Ending rooms hosted on dead worker"
        );

        for snapshot in &affected {
            sink.room_interrupted(snapshot);
            metrics::record_room_interrupted();
            self.remove_room(&snapshot.id).await;
        }

        for torn_down in in_teardown {
            wait_torn_down(torn_down).await;
        }

        affected.len()
    }

    // ------------------------------------------------------------------
    // Media objects
    // ------------------------------------------------------------------

    /// Register a transport under a room.
    ///
    /// Returns `false` (and registers nothing) if the room is gone or being
    /// torn down; the caller then owns the transport and should close it.
    pub async fn add_transport(&self, room_id: &RoomId, transport: Arc<dyn MediaTransport>) -> bool {
        let transport_id = transport.id();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(room) = state.open_room_mut(room_id) else {
            debug!(target: "rc.registry", room_id = %room_id, transport_id = %transport_id, "Transport not registered, room gone");
            return false;
        };
        room.transports.insert(transport_id.clone(), transport);
        if let Some(previous) = state.transport_index.insert(transport_id.clone(), room_id.clone()) {
            if &previous != room_id {
                if let Some(other) = state.rooms.get_mut(&previous) {
                    other.transports.remove(&transport_id);
                }
            }
        }
        state.publish_gauges();
        true
    }

    /// Register a producer under a room. See [`Self::add_transport`].
    pub async fn add_producer(&self, room_id: &RoomId, producer: Arc<dyn MediaProducer>) -> bool {
        let producer_id = producer.id();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(room) = state.open_room_mut(room_id) else {
            debug!(target: "rc.registry", room_id = %room_id, producer_id = %producer_id, "Producer not registered, room gone");
            return false;
        };
        room.producers.insert(producer_id.clone(), producer);
        if let Some(previous) = state.producer_index.insert(producer_id.clone(), room_id.clone()) {
            if &previous != room_id {
                if let Some(other) = state.rooms.get_mut(&previous) {
                    other.producers.remove(&producer_id);
                }
            }
        }
        state.publish_gauges();
        true
    }

    /// Register a consumer under a room. See [`Self::add_transport`].
    pub async fn add_consumer(&self, room_id: &RoomId, consumer: Arc<dyn MediaConsumer>) -> bool {
        let consumer_id = consumer.id();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(room) = state.open_room_mut(room_id) else {
            debug!(target: "rc.registry", room_id = %room_id, consumer_id = %consumer_id, "Consumer not registered, room gone");
            return false;
        };
        room.consumers.insert(consumer_id.clone(), consumer);
        if let Some(previous) = state.consumer_index.insert(consumer_id.clone(), room_id.clone()) {
            if &previous != room_id {
                if let Some(other) = state.rooms.get_mut(&previous) {
                    other.consumers.remove(&consumer_id);
                }
            }
        }
        state.publish_gauges();
        true
    }

    pub async fn room_for_transport(&self, transport_id: &TransportId) -> Option<RoomId> {
        self.state.lock().await.transport_index.get(transport_id).cloned()
    }

    pub async fn room_for_producer(&self, producer_id: &ProducerId) -> Option<RoomId> {
        self.state.lock().await.producer_index.get(producer_id).cloned()
    }

    pub async fn room_for_consumer(&self, consumer_id: &ConsumerId) -> Option<RoomId> {
        self.state.lock().await.consumer_index.get(consumer_id).cloned()
    }

    /// A registered transport, for `produce`/`consume` calls.
    pub async fn transport(&self, transport_id: &TransportId) -> Option<Arc<dyn MediaTransport>> {
        self.lookup_transport(transport_id).await.map(|(_, transport)| transport)
    }

    async fn lookup_transport(&self, transport_id: &TransportId) -> Option<(RoomId, Arc<dyn MediaTransport>)> {
        let state = self.state.lock().await;
        let room_id = state.transport_index.get(transport_id)?;
        let transport = state.rooms.get(room_id)?.transports.get(transport_id)?;
        Some((room_id.clone(), Arc::clone(transport)))
    }

    pub async fn producer(&self, producer_id: &ProducerId) -> Option<Arc<dyn MediaProducer>> {
        self.lookup_producer(producer_id).await.map(|(_, producer)| producer)
    }

    async fn lookup_producer(&self, producer_id: &ProducerId) -> Option<(RoomId, Arc<dyn MediaProducer>)> {
        let state = self.state.lock().await;
        let room_id = state.producer_index.get(producer_id)?;
        let producer = state.rooms.get(room_id)?.producers.get(producer_id)?;
        Some((room_id.clone(), Arc::clone(producer)))
    }

    pub async fn consumer(&self, consumer_id: &ConsumerId) -> Option<Arc<dyn MediaConsumer>> {
        self.lookup_consumer(consumer_id).await.map(|(_, consumer)| consumer)
    }

    async fn lookup_consumer(&self, consumer_id: &ConsumerId) -> Option<(RoomId, Arc<dyn MediaConsumer>)> {
        let state = self.state.lock().await;
        let room_id = state.consumer_index.get(consumer_id)?;
        let consumer = state.rooms.get(room_id)?.consumers.get(consumer_id)?;
        Some((room_id.clone(), Arc::clone(consumer)))
    }

    /// Close a transport and drop it from the registry.
    ///
    /// The registry entry is removed even when the engine close fails.
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// - `RcError::MediaEngine` - the engine close call failed
    #[instrument(skip_all, name = "rc.registry.close_transport", fields(transport_id = %transport_id))]
    pub async fn close_transport(&self, transport_id: &TransportId) -> Result<(), RcError> {
        let Some((room_id, transport)) = self.lookup_transport(transport_id).await else {
            debug!(target: "rc.registry", transport_id = %transport_id, "Close of unknown transport ignored");
            return Ok(());
        };

        let result = close_logged("transport", transport_id.as_str(), &room_id, transport.close()).await;

        let mut state = self.state.lock().await;
        state.unregister_transport(transport_id);
        state.publish_gauges();
        result.map_err(RcError::from)
    }

    /// Close a producer and drop it from the registry. See [`Self::close_transport`].
    ///
    /// # Errors
    ///
    /// - `RcError::MediaEngine` - the engine close call failed
    #[instrument(skip_all, name = "rc.registry.close_producer", fields(producer_id = %producer_id))]
    pub async fn close_producer(&self, producer_id: &ProducerId) -> Result<(), RcError> {
        let Some((room_id, producer)) = self.lookup_producer(producer_id).await else {
            debug!(target: "rc.registry", producer_id = %producer_id, "Close of unknown producer ignored");
            return Ok(());
        };

        let result = close_logged("producer", producer_id.as_str(), &room_id, producer.close()).await;

        let mut state = self.state.lock().await;
        state.unregister_producer(producer_id);
        state.publish_gauges();
        result.map_err(RcError::from)
    }

    /// Close a consumer and drop it from the registry. See [`Self::close_transport`].
    ///
    /// # Errors
    ///
    /// - `RcError::MediaEngine` - the engine close call failed
    #[instrument(skip_all, name = "rc.registry.close_consumer", fields(consumer_id = %consumer_id))]
    pub async fn close_consumer(&self, consumer_id: &ConsumerId) -> Result<(), RcError> {
        let Some((room_id, consumer)) = self.lookup_consumer(consumer_id).await else {
            debug!(target: "rc.registry", consumer_id = %consumer_id, "Close of unknown consumer ignored");
            return Ok(());
        };

        let result = close_logged("consumer", consumer_id.as_str(), &room_id, consumer.close()).await;

        let mut state = self.state.lock().await;
        state.unregister_consumer(consumer_id);
        state.publish_gauges();
        result.map_err(RcError::from)
    }

    // ------------------------------------------------------------------
    // Participants and chat
    // ------------------------------------------------------------------

    /// Add a participant, replacing any entry with the same session id.
    ///
    /// # Errors
    ///
    /// - `RcError::RoomNotFound` - the room is gone or being torn down
    pub async fn add_participant(&self, room_id: &RoomId, participant: Participant) -> Result<(), RcError> {
        let mut state = self.state.lock().await;
        let room = state
            .open_room_mut(room_id)
            .ok_or_else(|| RcError::RoomNotFound(room_id.clone()))?;

        match room.participant_mut(&participant.session_id) {
            Some(existing) => *existing = participant,
            None => room.participants.push(participant),
        }
        Ok(())
    }

    /// Apply `mutation` to a participant and return its new state.
    ///
    /// # Errors
    ///
    /// - `RcError::RoomNotFound` - the room is gone or being torn down
    /// - `RcError::ParticipantNotFound` - no participant with `session_id`
    pub async fn update_participant<F>(
        &self,
        room_id: &RoomId,
        session_id: &str,
        mutation: F,
    ) -> Result<Participant, RcError>
    where
        F: FnOnce(&mut Participant),
    {
        let mut state = self.state.lock().await;
        let room = state
            .open_room_mut(room_id)
            .ok_or_else(|| RcError::RoomNotFound(room_id.clone()))?;
        let participant = room
            .participant_mut(session_id)
            .ok_or_else(|| RcError::ParticipantNotFound(session_id.to_string()))?;

        mutation(participant);
        Ok(participant.clone())
    }

    /// Flag a participant as disconnected; media flags are cleared.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_participant`].
    pub async fn mark_participant_disconnected(
        &self,
        room_id: &RoomId,
        session_id: &str,
    ) -> Result<Participant, RcError> {
        self.update_participant(room_id, session_id, |p| {
            p.disconnected = true;
            p.is_streaming_camera = false;
            p.is_screen_sharing = false;
        })
        .await
    }

    /// Remove a participant. Unknown rooms and sessions yield `None`.
    pub async fn remove_participant(&self, room_id: &RoomId, session_id: &str) -> Option<Participant> {
        let mut state = self.state.lock().await;
        let room = state.rooms.get_mut(room_id)?;
        let position = room
            .participants
            .iter()
            .position(|p| p.session_id == session_id)?;
        Some(room.participants.remove(position))
    }

    /// Append to the room's chat history, evicting the oldest messages beyond
    /// the configured limit.
    ///
    /// # Errors
    ///
    /// - `RcError::RoomNotFound` - the room is gone or being torn down
    pub async fn record_chat_message(&self, room_id: &RoomId, message: ChatMessage) -> Result<(), RcError> {
        let limit = self.config.chat_history_limit;
        let mut state = self.state.lock().await;
        let room = state
            .open_room_mut(room_id)
            .ok_or_else(|| RcError::RoomNotFound(room_id.clone()))?;
        room.push_chat_message(message, limit);
        Ok(())
    }
}

/// Wait until a closing room has left the registry.
async fn wait_torn_down(mut torn_down: watch::Receiver<bool>) {
    // A dropped sender means the room record is gone as well.
    let _ = torn_down.wait_for(|removed| *removed).await;
}

/// Await an engine close call, logging and counting a failure.
async fn close_logged<F>(
    kind: &'static str,
    object_id: &str,
    room_id: &RoomId,
    close: F,
) -> Result<(), MediaError>
where
    F: Future<Output = Result<(), MediaError>>,
{
    let result = close.await;
    if let Err(e) = &result {
        metrics::record_media_close_failure(kind);
        warn!(
            target: "rc.registry",
            room_id = %room_id,
            kind,
            object_id,
            error = %e,
            "Media object close failed"
        );
    }
    result
}
