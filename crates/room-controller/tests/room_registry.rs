//! Integration tests for `RoomRegistry` against the mock media engine.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use rc_test_utils::{
    open_media, test_config, MockMediaEngine, ObjectKind, RecordingSink, TestRoom, FIRST_MOCK_PID,
    TEST_CHAT_HISTORY_LIMIT,
};
use room_controller::media::{
    ConsumeOptions, MediaError, MediaKind, ProduceOptions, WebRtcTransportOptions,
};
use room_controller::observability::HealthState;
use room_controller::rooms::{
    ChatMessage, Participant, RegistryConfig, RegistryStats, RoomRegistry, RoomSnapshot,
};
use room_controller::types::{ConsumerId, ProducerId, RoomId, TransportId, WorkerId};
use room_controller::workers::{WorkerPool, WorkerPoolConfig};
use room_controller::RcError;
use std::sync::{Arc, Mutex};

struct Harness {
    engine: MockMediaEngine,
    registry: Arc<RoomRegistry>,
}

async fn setup(worker_count: usize) -> Harness {
    setup_with(MockMediaEngine::default(), worker_count).await
}

async fn setup_with(engine: MockMediaEngine, worker_count: usize) -> Harness {
    let config = test_config(worker_count);
    let (pool, _deaths) = WorkerPool::initialize(
        engine.as_engine(),
        WorkerPoolConfig::from(&config),
        Arc::new(HealthState::new()),
    )
    .await
    .unwrap();

    Harness {
        engine,
        registry: Arc::new(RoomRegistry::new(pool, RegistryConfig::from(&config))),
    }
}

/// Every id listed under a room resolves back to that room, and the index
/// sizes equal the summed room collections.
async fn assert_indexes_consistent(registry: &RoomRegistry) {
    let rooms = registry.get_all_rooms().await;
    for room in &rooms {
        for id in &room.transport_ids {
            assert_eq!(registry.room_for_transport(id).await.as_ref(), Some(&room.id));
        }
        for id in &room.producer_ids {
            assert_eq!(registry.room_for_producer(id).await.as_ref(), Some(&room.id));
        }
        for id in &room.consumer_ids {
            assert_eq!(registry.room_for_consumer(id).await.as_ref(), Some(&room.id));
        }
    }

    let stats = registry.stats().await;
    assert_eq!(stats.rooms, rooms.len());
    assert_eq!(stats.transports, rooms.iter().map(|r| r.transport_ids.len()).sum::<usize>());
    assert_eq!(stats.producers, rooms.iter().map(|r| r.producer_ids.len()).sum::<usize>());
    assert_eq!(stats.consumers, rooms.iter().map(|r| r.consumer_ids.len()).sum::<usize>());
}

// ----------------------------------------------------------------------------
// Room creation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_create_room_registers_creator() {
    let h = setup(2).await;

    let room = TestRoom::new("standup")
        .with_name("Daily Standup")
        .with_creator("Bob", "session-bob")
        .create_in(&h.registry)
        .await
        .unwrap();

    assert_eq!(room.id, RoomId::from("standup"));
    assert_eq!(room.display_name, "Daily Standup");
    assert_eq!(room.participants.len(), 1);
    assert!(room.participants[0].is_creator);
    assert_eq!(room.participants[0].session_id, "session-bob");

    assert!(h.registry.has_room(&room.id).await);
    assert_eq!(h.registry.get_room(&room.id).await, Some(room.clone()));
    assert!(h.registry.router(&room.id).await.is_some());
    assert_eq!(h.registry.room_count().await, 1);
}

#[tokio::test]
async fn test_create_room_duplicate_id_fails_without_mutation() {
    let h = setup(2).await;
    let first = TestRoom::new("standup").create_in(&h.registry).await.unwrap();

    let second = TestRoom::new("standup")
        .with_creator("Mallory", "session-mallory")
        .create_in(&h.registry)
        .await;

    assert!(matches!(second, Err(RcError::IdAlreadyExists(id)) if id == first.id));
    assert_eq!(h.registry.room_count().await, 1);
    assert_eq!(h.registry.get_room(&first.id).await, Some(first));
}

#[tokio::test]
async fn test_router_failure_registers_nothing() {
    let h = setup(1).await;
    h.engine.set_router_creation_failing(true);

    let result = TestRoom::new("doomed").create_in(&h.registry).await;

    assert!(matches!(
        result,
        Err(RcError::MediaEngine(MediaError::Create(_)))
    ));
    assert!(!h.registry.has_room(&RoomId::from("doomed")).await);
    assert_eq!(h.registry.room_count().await, 0);

    h.engine.set_router_creation_failing(false);
    assert!(TestRoom::new("doomed").create_in(&h.registry).await.is_ok());
}

#[tokio::test]
async fn test_router_finished_on_departed_worker_is_rolled_back() {
    let h = setup_with(MockMediaEngine::builder().hold_router_creation().build(), 2).await;

    let creating = {
        let registry = Arc::clone(&h.registry);
        tokio::spawn(async move { TestRoom::new("late").create_in(&registry).await })
    };
    yield_a_while().await;

    // No death scan runs here; leaving the pool is enough.
    assert!(h.engine.kill_worker(FIRST_MOCK_PID));
    yield_a_while().await;
    h.engine.release_router_creation(1);

    assert!(matches!(
        creating.await.unwrap(),
        Err(RcError::MediaEngine(MediaError::WorkerClosed(_)))
    ));
    assert!(!h.registry.has_room(&RoomId::from("late")).await);
    assert_eq!(h.engine.close_order(), vec![ObjectKind::Router]);
}

#[tokio::test]
async fn test_rooms_alternate_between_two_workers() {
    let h = setup(2).await;

    let mut owners = Vec::new();
    for i in 0..5 {
        let room = TestRoom::new(format!("room-{i}")).create_in(&h.registry).await.unwrap();
        owners.push(room.owner_worker_id);
    }

    assert_eq!(
        owners,
        vec![WorkerId(0), WorkerId(1), WorkerId(0), WorkerId(1), WorkerId(0)]
    );
}

#[tokio::test]
async fn test_stop_accepting_rejects_new_rooms() {
    let h = setup(1).await;
    let existing = TestRoom::new("existing").create_in(&h.registry).await.unwrap();

    h.registry.stop_accepting().await;

    assert!(matches!(
        TestRoom::new("late").create_in(&h.registry).await,
        Err(RcError::Draining)
    ));
    assert!(h.registry.has_room(&existing.id).await);
}

#[tokio::test]
async fn test_get_all_rooms_lists_every_room() {
    let h = setup(2).await;
    for name in ["a", "b", "c"] {
        TestRoom::new(name).create_in(&h.registry).await.unwrap();
    }

    let mut ids: Vec<RoomId> = h
        .registry
        .get_all_rooms()
        .await
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();

    assert_eq!(ids, vec![RoomId::from("a"), RoomId::from("b"), RoomId::from("c")]);
    assert_eq!(h.registry.room_ids().await, ids);
}

// ----------------------------------------------------------------------------
// Media objects
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_reverse_lookups_resolve_owning_room() {
    let h = setup(2).await;
    let a = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let b = TestRoom::new("b").create_in(&h.registry).await.unwrap();

    let media_a = open_media(&h.registry, &a.id).await;
    let media_b = open_media(&h.registry, &b.id).await;

    assert_eq!(h.registry.room_for_transport(&media_a.transport_id).await, Some(a.id.clone()));
    assert_eq!(h.registry.room_for_producer(&media_a.producer_id).await, Some(a.id.clone()));
    assert_eq!(h.registry.room_for_consumer(&media_a.consumer_id).await, Some(a.id.clone()));
    assert_eq!(h.registry.room_for_consumer(&media_b.consumer_id).await, Some(b.id.clone()));

    let snapshot = h.registry.get_room(&a.id).await.unwrap();
    assert_eq!(snapshot.transport_ids, vec![media_a.transport_id.clone()]);
    assert_eq!(snapshot.producer_ids, vec![media_a.producer_id.clone()]);
    assert_eq!(snapshot.consumer_ids, vec![media_a.consumer_id.clone()]);

    let consumer = h.registry.consumer(&media_a.consumer_id).await.unwrap();
    assert_eq!(consumer.producer_id(), media_a.producer_id);
    assert!(h.registry.producer(&media_b.producer_id).await.is_some());

    assert_indexes_consistent(&h.registry).await;
}

#[tokio::test]
async fn test_unknown_ids_resolve_to_nothing() {
    let h = setup(1).await;

    assert!(h.registry.room_for_transport(&TransportId::from("nope")).await.is_none());
    assert!(h.registry.room_for_producer(&ProducerId::from("nope")).await.is_none());
    assert!(h.registry.room_for_consumer(&ConsumerId::from("nope")).await.is_none());
    assert!(h.registry.transport(&TransportId::from("nope")).await.is_none());
    assert!(h.registry.router(&RoomId::from("nope")).await.is_none());
    assert!(h.registry.get_room(&RoomId::from("nope")).await.is_none());
}

#[tokio::test]
async fn test_close_consumer_removes_from_room_and_index() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let media = open_media(&h.registry, &room.id).await;

    h.registry.close_consumer(&media.consumer_id).await.unwrap();

    assert!(h.registry.room_for_consumer(&media.consumer_id).await.is_none());
    let snapshot = h.registry.get_room(&room.id).await.unwrap();
    assert!(snapshot.consumer_ids.is_empty());
    assert_eq!(snapshot.producer_ids, vec![media.producer_id]);
    assert_eq!(h.engine.close_order(), vec![ObjectKind::Consumer]);
    assert_indexes_consistent(&h.registry).await;
}

#[tokio::test]
async fn test_close_unknown_ids_is_noop() {
    let h = setup(1).await;
    TestRoom::new("a").create_in(&h.registry).await.unwrap();

    h.registry.close_transport(&TransportId::from("ghost")).await.unwrap();
    h.registry.close_producer(&ProducerId::from("ghost")).await.unwrap();
    h.registry.close_consumer(&ConsumerId::from("ghost")).await.unwrap();

    assert!(h.engine.close_journal().is_empty());
    assert_eq!(h.registry.room_count().await, 1);
}

#[tokio::test]
async fn test_close_failure_still_unregisters() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let media = open_media(&h.registry, &room.id).await;

    h.engine.set_close_failing(true);
    let result = h.registry.close_producer(&media.producer_id).await;

    assert!(matches!(result, Err(RcError::MediaEngine(MediaError::Close(_)))));
    assert!(h.registry.room_for_producer(&media.producer_id).await.is_none());
    assert!(h.registry.get_room(&room.id).await.unwrap().producer_ids.is_empty());
    assert_indexes_consistent(&h.registry).await;
}

#[tokio::test]
async fn test_add_to_unknown_room_returns_false() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let router = h.registry.router(&room.id).await.unwrap();
    let transport = router
        .create_webrtc_transport(&WebRtcTransportOptions::default())
        .await
        .unwrap();
    let transport_id = transport.id();

    assert!(!h.registry.add_transport(&RoomId::from("missing"), transport).await);
    assert!(h.registry.room_for_transport(&transport_id).await.is_none());
    assert_eq!(h.registry.stats().await.transports, 0);
}

// ----------------------------------------------------------------------------
// Teardown
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_remove_room_closes_in_order_and_clears_indexes() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let first = open_media(&h.registry, &room.id).await;
    let second = open_media(&h.registry, &room.id).await;

    h.registry.remove_room(&room.id).await;

    assert_eq!(
        h.engine.close_order(),
        vec![
            ObjectKind::Consumer,
            ObjectKind::Consumer,
            ObjectKind::Producer,
            ObjectKind::Producer,
            ObjectKind::Transport,
            ObjectKind::Transport,
            ObjectKind::Router,
        ]
    );

    assert!(!h.registry.has_room(&room.id).await);
    for media in [&first, &second] {
        assert!(h.registry.room_for_transport(&media.transport_id).await.is_none());
        assert!(h.registry.room_for_producer(&media.producer_id).await.is_none());
        assert!(h.registry.room_for_consumer(&media.consumer_id).await.is_none());
    }
    assert!(h.registry.get_all_rooms().await.is_empty());
    assert_eq!(h.registry.stats().await, RegistryStats::default());
}

#[tokio::test]
async fn test_remove_room_is_idempotent() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    open_media(&h.registry, &room.id).await;

    h.registry.remove_room(&room.id).await;
    let closes = h.engine.close_journal().len();

    h.registry.remove_room(&room.id).await;
    h.registry.remove_room(&RoomId::from("never-existed")).await;

    assert_eq!(h.engine.close_journal().len(), closes);
    assert!(!h.registry.has_room(&room.id).await);
}

#[tokio::test]
async fn test_add_after_remove_is_noop() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let media = open_media(&h.registry, &room.id).await;

    // Keep a handle the signaling layer might still hold.
    let transport = h.registry.transport(&media.transport_id).await.unwrap();
    let producer = h.registry.producer(&media.producer_id).await.unwrap();

    h.registry.remove_room(&room.id).await;

    assert!(!h.registry.add_producer(&room.id, producer).await);
    assert!(!h.registry.add_transport(&room.id, transport).await);
    assert!(h.registry.room_for_producer(&media.producer_id).await.is_none());
    assert!(h.registry.room_for_transport(&media.transport_id).await.is_none());
    assert!(!h.registry.has_room(&room.id).await);
}

/// Start `remove_room` in the background and return once it is blocked in
/// its first close call.
async fn start_held_teardown(h: &Harness, room_id: &RoomId) -> tokio::task::JoinHandle<()> {
    let teardown = {
        let registry = Arc::clone(&h.registry);
        let room_id = room_id.clone();
        tokio::spawn(async move { registry.remove_room(&room_id).await })
    };
    h.engine.wait_for_held_close().await;
    teardown
}

async fn yield_a_while() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_closing_room_rejects_new_objects() {
    let h = setup_with(MockMediaEngine::builder().hold_closes().build(), 1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let media = open_media(&h.registry, &room.id).await;

    // Objects created while the teardown is in flight.
    let router = h.registry.router(&room.id).await.unwrap();
    let transport = router
        .create_webrtc_transport(&WebRtcTransportOptions::default())
        .await
        .unwrap();
    let producer = transport
        .produce(ProduceOptions {
            kind: MediaKind::Audio,
            rtp_parameters: serde_json::json!({ "mid": "1" }),
        })
        .await
        .unwrap();
    let consumer = transport
        .consume(ConsumeOptions {
            producer_id: producer.id(),
            rtp_capabilities: serde_json::json!({ "kind": "audio" }),
            paused: false,
        })
        .await
        .unwrap();
    let (transport_id, producer_id, consumer_id) = (transport.id(), producer.id(), consumer.id());

    let teardown = start_held_teardown(&h, &room.id).await;

    assert!(!h.registry.add_transport(&room.id, transport).await);
    assert!(!h.registry.add_producer(&room.id, producer).await);
    assert!(!h.registry.add_consumer(&room.id, consumer).await);
    assert!(h.registry.room_for_transport(&transport_id).await.is_none());
    assert!(h.registry.room_for_producer(&producer_id).await.is_none());
    assert!(h.registry.room_for_consumer(&consumer_id).await.is_none());
    assert!(h.registry.router(&room.id).await.is_none());

    let snapshot = h.registry.get_room(&room.id).await.unwrap();
    assert!(!snapshot.transport_ids.contains(&transport_id));
    assert_eq!(snapshot.producer_ids, vec![media.producer_id.clone()]);

    h.engine.release_closes(4);
    teardown.await.unwrap();

    assert_eq!(h.registry.stats().await, RegistryStats::default());
}

#[tokio::test]
async fn test_closing_room_keeps_its_id_reserved() {
    let h = setup_with(MockMediaEngine::builder().hold_closes().build(), 1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    open_media(&h.registry, &room.id).await;

    let teardown = start_held_teardown(&h, &room.id).await;

    assert!(h.registry.has_room(&room.id).await);
    assert!(matches!(
        TestRoom::new("a").create_in(&h.registry).await,
        Err(RcError::IdAlreadyExists(id)) if id == room.id
    ));

    h.engine.release_closes(4);
    teardown.await.unwrap();

    assert!(!h.registry.has_room(&room.id).await);
    TestRoom::new("a").create_in(&h.registry).await.unwrap();
}

#[tokio::test]
async fn test_second_remove_waits_for_teardown_in_progress() {
    let h = setup_with(MockMediaEngine::builder().hold_closes().build(), 1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let media = open_media(&h.registry, &room.id).await;

    let first = start_held_teardown(&h, &room.id).await;
    let second = {
        let registry = Arc::clone(&h.registry);
        let room_id = room.id.clone();
        tokio::spawn(async move { registry.remove_room(&room_id).await })
    };

    yield_a_while().await;
    assert!(!second.is_finished());
    assert_eq!(h.engine.held_closes(), 1, "second caller must not close anything");

    h.engine.release_closes(4);
    second.await.unwrap();

    assert!(!h.registry.has_room(&room.id).await);
    assert!(h.registry.room_for_consumer(&media.consumer_id).await.is_none());
    assert!(h.registry.room_for_transport(&media.transport_id).await.is_none());
    first.await.unwrap();
    assert_eq!(h.engine.close_journal().len(), 4);
}

#[tokio::test]
async fn test_worker_death_waits_for_rooms_in_teardown() {
    let h = setup_with(MockMediaEngine::builder().hold_closes().build(), 1).await;
    let a = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    let b = TestRoom::new("b").create_in(&h.registry).await.unwrap();
    open_media(&h.registry, &a.id).await;

    let teardown = start_held_teardown(&h, &a.id).await;
    let sink = Arc::new(RecordingSink::new());
    let death = {
        let registry = Arc::clone(&h.registry);
        let sink = Arc::clone(&sink);
        tokio::spawn(async move { registry.handle_worker_death(WorkerId(0), sink.as_ref()).await })
    };

    yield_a_while().await;
    assert!(!death.is_finished());

    // a: consumer, producer, transport, router. b: router.
    h.engine.release_closes(5);
    let ended = death.await.unwrap();

    assert_eq!(ended, 1);
    assert_eq!(sink.interrupted_ids(), vec![b.id.clone()]);
    assert!(h.registry.get_all_rooms().await.is_empty());
    assert_eq!(h.registry.stats().await, RegistryStats::default());
    teardown.await.unwrap();
}

#[tokio::test]
async fn test_close_failures_do_not_block_teardown() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();
    open_media(&h.registry, &room.id).await;

    h.engine.set_close_failing(true);
    h.registry.remove_room(&room.id).await;

    let journal = h.engine.close_journal();
    assert_eq!(journal.len(), 4, "every object close is attempted once");
    assert!(journal.iter().all(|record| !record.succeeded));
    assert!(!h.registry.has_room(&room.id).await);
    assert_eq!(h.registry.stats().await, RegistryStats::default());
}

#[tokio::test]
async fn test_handle_worker_death_removes_only_that_workers_rooms() {
    let h = setup(2).await;
    let a = TestRoom::new("a").create_in(&h.registry).await.unwrap(); // w0
    let b = TestRoom::new("b").create_in(&h.registry).await.unwrap(); // w1
    let c = TestRoom::new("c").create_in(&h.registry).await.unwrap(); // w0
    let media_a = open_media(&h.registry, &a.id).await;
    open_media(&h.registry, &b.id).await;

    let seen = Mutex::new(Vec::new());
    let sink = |room: &RoomSnapshot| seen.lock().unwrap().push(room.id.clone());

    let ended = h.registry.handle_worker_death(WorkerId(0), &sink).await;

    assert_eq!(ended, 2);
    assert_eq!(*seen.lock().unwrap(), vec![a.id.clone(), c.id.clone()]);
    assert!(!h.registry.has_room(&a.id).await);
    assert!(!h.registry.has_room(&c.id).await);
    assert!(h.registry.has_room(&b.id).await);
    assert!(h.registry.room_for_transport(&media_a.transport_id).await.is_none());
    assert_indexes_consistent(&h.registry).await;
}

#[tokio::test]
async fn test_handle_worker_death_without_rooms() {
    let h = setup(2).await;
    TestRoom::new("a").create_in(&h.registry).await.unwrap(); // w0
    let sink = RecordingSink::new();

    assert_eq!(h.registry.handle_worker_death(WorkerId(1), &sink).await, 0);
    assert!(sink.interrupted_ids().is_empty());
    assert_eq!(h.registry.room_count().await, 1);
}

#[tokio::test]
async fn test_remove_all_rooms() {
    let h = setup(2).await;
    for name in ["a", "b", "c"] {
        let room = TestRoom::new(name).create_in(&h.registry).await.unwrap();
        open_media(&h.registry, &room.id).await;
    }

    h.registry.remove_all_rooms().await;

    assert_eq!(h.registry.stats().await, RegistryStats::default());
    assert_eq!(
        h.engine
            .close_order()
            .iter()
            .filter(|kind| **kind == ObjectKind::Router)
            .count(),
        3
    );
}

// ----------------------------------------------------------------------------
// Participants and chat
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_participant_lifecycle() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();

    h.registry
        .add_participant(&room.id, Participant::new("session-bob", "Bob"))
        .await
        .unwrap();

    let bob = h
        .registry
        .update_participant(&room.id, "session-bob", |p| p.is_streaming_camera = true)
        .await
        .unwrap();
    assert!(bob.is_streaming_camera);
    assert!(!bob.is_creator);

    let bob = h
        .registry
        .mark_participant_disconnected(&room.id, "session-bob")
        .await
        .unwrap();
    assert!(bob.disconnected);
    assert!(!bob.is_streaming_camera);

    let snapshot = h.registry.get_room(&room.id).await.unwrap();
    assert_eq!(snapshot.participants.len(), 2);
    assert_eq!(snapshot.connected_participants().count(), 1);

    let removed = h.registry.remove_participant(&room.id, "session-bob").await;
    assert_eq!(removed.map(|p| p.display_name), Some("Bob".to_string()));
    assert!(h.registry.remove_participant(&room.id, "session-bob").await.is_none());
}

#[tokio::test]
async fn test_rejoin_replaces_participant_entry() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();

    h.registry
        .add_participant(&room.id, Participant::new("session-bob", "Bob"))
        .await
        .unwrap();
    h.registry
        .mark_participant_disconnected(&room.id, "session-bob")
        .await
        .unwrap();
    h.registry
        .add_participant(&room.id, Participant::new("session-bob", "Bobby"))
        .await
        .unwrap();

    let snapshot = h.registry.get_room(&room.id).await.unwrap();
    assert_eq!(snapshot.participants.len(), 2);
    let bob = snapshot.participant("session-bob").unwrap();
    assert_eq!(bob.display_name, "Bobby");
    assert!(!bob.disconnected);
}

#[tokio::test]
async fn test_participant_errors() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();

    assert!(matches!(
        h.registry
            .add_participant(&RoomId::from("missing"), Participant::new("s", "S"))
            .await,
        Err(RcError::RoomNotFound(_))
    ));
    assert!(matches!(
        h.registry
            .update_participant(&room.id, "session-nobody", |p| p.is_screen_sharing = true)
            .await,
        Err(RcError::ParticipantNotFound(_))
    ));
    assert!(h
        .registry
        .remove_participant(&RoomId::from("missing"), "session-alice")
        .await
        .is_none());
}

#[tokio::test]
async fn test_chat_history_keeps_most_recent_messages() {
    let h = setup(1).await;
    let room = TestRoom::new("a").create_in(&h.registry).await.unwrap();

    let total = TEST_CHAT_HISTORY_LIMIT + 3;
    for i in 0..total {
        h.registry
            .record_chat_message(&room.id, ChatMessage::new("session-alice", "Alice", format!("msg {i}")))
            .await
            .unwrap();
    }

    let history = h.registry.get_room(&room.id).await.unwrap().chat_history;
    assert_eq!(history.len(), TEST_CHAT_HISTORY_LIMIT);
    assert_eq!(history[0].text, "msg 3");
    assert_eq!(history[TEST_CHAT_HISTORY_LIMIT - 1].text, format!("msg {}", total - 1));

    assert!(matches!(
        h.registry
            .record_chat_message(&RoomId::from("missing"), ChatMessage::new("s", "S", "hi"))
            .await,
        Err(RcError::RoomNotFound(_))
    ));
}
