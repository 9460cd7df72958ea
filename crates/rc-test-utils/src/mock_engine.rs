//! Mock media engine for Room Controller testing.
//!
//! Provides an in-process engine that can be configured to:
//! - Fail chosen worker spawns (by attempt index) or all of them
//! - Fail router creation or every close call
//! - Hold router creation until the test releases it
//! - Hold close calls until the test releases them
//! - Kill workers on demand
//!
//! Every close call is appended to a shared journal, so tests can assert the
//! order in which a room was torn down.
//!
//! # Example
//!
//! ```rust,ignore
//! use rc_test_utils::MockMediaEngine;
//!
//! let engine = MockMediaEngine::builder()
//!     .fail_spawn_at([1])
//!     .build();
//!
//! // Hand `engine.as_engine()` to the pool, then:
//! engine.kill_worker(engine.worker_pids()[0]);
//! ```

use async_trait::async_trait;
use room_controller::media::{
    ConsumeOptions, MediaConsumer, MediaEngine, MediaError, MediaKind, MediaProducer, MediaRouter,
    MediaTransport, MediaWorker, ProduceOptions, RtpCodecCapability, WebRtcTransportOptions,
    WorkerSettings,
};
use room_controller::types::{ConsumerId, ProducerId, RouterId, TransportId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// First pid handed out by the mock engine.
pub const FIRST_MOCK_PID: u32 = 4000;

/// Kind of media object recorded in the close journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Router,
    Transport,
    Producer,
    Consumer,
}

/// One close call seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRecord {
    pub kind: ObjectKind,
    pub id: String,
    pub succeeded: bool,
}

struct EngineShared {
    spawn_attempts: AtomicUsize,
    fail_spawn_at: HashSet<usize>,
    fail_all_spawns: AtomicBool,
    fail_router_creation: AtomicBool,
    fail_closes: AtomicBool,
    router_gate: Option<Semaphore>,
    close_gate: Option<Semaphore>,
    held_closes: AtomicUsize,
    next_pid: AtomicU32,
    workers: Mutex<Vec<Arc<WorkerShared>>>,
    journal: Mutex<Vec<CloseRecord>>,
}

impl EngineShared {
    /// Block while close calls are held.
    async fn pass_close_gate(&self) {
        if let Some(gate) = &self.close_gate {
            self.held_closes.fetch_add(1, Ordering::SeqCst);
            gate.acquire().await.expect("close gate closed").forget();
            self.held_closes.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn close(&self, kind: ObjectKind, id: &str, worker: &WorkerShared, closed: &AtomicBool) -> Result<(), MediaError> {
        let result = if self.fail_closes.load(Ordering::SeqCst) {
            Err(MediaError::Close(format!("injected close failure for {id}")))
        } else if worker.is_dead() {
            Err(MediaError::WorkerClosed(format!("worker {} is dead", worker.pid)))
        } else {
            Ok(())
        };

        closed.store(true, Ordering::SeqCst);
        self.journal.lock().unwrap().push(CloseRecord {
            kind,
            id: id.to_string(),
            succeeded: result.is_ok(),
        });
        result
    }
}

struct WorkerShared {
    pid: u32,
    death: CancellationToken,
}

impl WorkerShared {
    fn is_dead(&self) -> bool {
        self.death.is_cancelled()
    }
}

/// Mock media engine.
#[derive(Clone)]
pub struct MockMediaEngine {
    shared: Arc<EngineShared>,
}

impl Default for MockMediaEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MockMediaEngine {
    /// Create a new MockMediaEngine builder.
    #[must_use]
    pub fn builder() -> MockMediaEngineBuilder {
        MockMediaEngineBuilder::default()
    }

    /// The engine as a trait object, ready for `WorkerPool::initialize`.
    #[must_use]
    pub fn as_engine(&self) -> Arc<dyn MediaEngine> {
        Arc::new(self.clone())
    }

    /// Number of `create_worker` calls so far, successful or not.
    #[must_use]
    pub fn spawn_attempts(&self) -> usize {
        self.shared.spawn_attempts.load(Ordering::SeqCst)
    }

    /// Pids of every worker spawned, alive or dead, in spawn order.
    #[must_use]
    pub fn worker_pids(&self) -> Vec<u32> {
        self.shared
            .workers
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.pid)
            .collect()
    }

    /// Pids of workers that have not been killed.
    #[must_use]
    pub fn live_worker_pids(&self) -> Vec<u32> {
        self.shared
            .workers
            .lock()
            .unwrap()
            .iter()
            .filter(|w| !w.is_dead())
            .map(|w| w.pid)
            .collect()
    }

    /// Kill a worker. Returns false for an unknown pid.
    pub fn kill_worker(&self, pid: u32) -> bool {
        let workers = self.shared.workers.lock().unwrap();
        match workers.iter().find(|w| w.pid == pid) {
            Some(worker) => {
                worker.death.cancel();
                true
            }
            None => false,
        }
    }

    /// Make every following spawn fail (or succeed again).
    pub fn set_spawn_failing(&self, failing: bool) {
        self.shared.fail_all_spawns.store(failing, Ordering::SeqCst);
    }

    pub fn set_router_creation_failing(&self, failing: bool) {
        self.shared
            .fail_router_creation
            .store(failing, Ordering::SeqCst);
    }

    pub fn set_close_failing(&self, failing: bool) {
        self.shared.fail_closes.store(failing, Ordering::SeqCst);
    }

    /// Let `count` held router creations proceed.
    ///
    /// Panics unless the engine was built with `hold_router_creation`.
    pub fn release_router_creation(&self, count: usize) {
        self.shared
            .router_gate
            .as_ref()
            .expect("engine was not built with hold_router_creation()")
            .add_permits(count);
    }

    /// Let `count` held close calls proceed.
    ///
    /// Panics unless the engine was built with `hold_closes`.
    pub fn release_closes(&self, count: usize) {
        self.shared
            .close_gate
            .as_ref()
            .expect("engine was not built with hold_closes()")
            .add_permits(count);
    }

    /// Number of close calls currently blocked on the gate.
    #[must_use]
    pub fn held_closes(&self) -> usize {
        self.shared.held_closes.load(Ordering::SeqCst)
    }

    /// Yield until at least one close call is blocked on the gate.
    pub async fn wait_for_held_close(&self) {
        while self.held_closes() == 0 {
            tokio::task::yield_now().await;
        }
    }

    /// Every close call seen so far, in call order.
    #[must_use]
    pub fn close_journal(&self) -> Vec<CloseRecord> {
        self.shared.journal.lock().unwrap().clone()
    }

    /// Kinds of the recorded close calls, in call order.
    #[must_use]
    pub fn close_order(&self) -> Vec<ObjectKind> {
        self.close_journal().into_iter().map(|r| r.kind).collect()
    }

    pub fn clear_close_journal(&self) {
        self.shared.journal.lock().unwrap().clear();
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn create_worker(&self, settings: &WorkerSettings) -> Result<Arc<dyn MediaWorker>, MediaError> {
        let attempt = self.shared.spawn_attempts.fetch_add(1, Ordering::SeqCst);

        if self.shared.fail_all_spawns.load(Ordering::SeqCst)
            || self.shared.fail_spawn_at.contains(&attempt)
        {
            return Err(MediaError::WorkerSpawn(format!(
                "injected spawn failure (attempt {attempt})"
            )));
        }
        if settings.rtc_min_port > settings.rtc_max_port {
            return Err(MediaError::InvalidRequest("empty RTC port range".to_string()));
        }

        let worker = Arc::new(WorkerShared {
            pid: self.shared.next_pid.fetch_add(1, Ordering::SeqCst),
            death: CancellationToken::new(),
        });
        self.shared.workers.lock().unwrap().push(Arc::clone(&worker));

        Ok(Arc::new(MockWorker {
            engine: Arc::clone(&self.shared),
            worker,
        }))
    }
}

/// Builder for [`MockMediaEngine`].
#[derive(Default)]
pub struct MockMediaEngineBuilder {
    fail_spawn_at: HashSet<usize>,
    fail_all_spawns: bool,
    fail_router_creation: bool,
    fail_closes: bool,
    hold_router_creation: bool,
    hold_closes: bool,
}

impl MockMediaEngineBuilder {
    /// Fail the spawn attempts with these zero-based indices.
    #[must_use]
    pub fn fail_spawn_at(mut self, attempts: impl IntoIterator<Item = usize>) -> Self {
        self.fail_spawn_at.extend(attempts);
        self
    }

    #[must_use]
    pub fn fail_all_spawns(mut self) -> Self {
        self.fail_all_spawns = true;
        self
    }

    #[must_use]
    pub fn fail_router_creation(mut self) -> Self {
        self.fail_router_creation = true;
        self
    }

    #[must_use]
    pub fn fail_closes(mut self) -> Self {
        self.fail_closes = true;
        self
    }

    /// Block router creation until [`MockMediaEngine::release_router_creation`].
    #[must_use]
    pub fn hold_router_creation(mut self) -> Self {
        self.hold_router_creation = true;
        self
    }

    /// Block every close call until [`MockMediaEngine::release_closes`].
    #[must_use]
    pub fn hold_closes(mut self) -> Self {
        self.hold_closes = true;
        self
    }

    #[must_use]
    pub fn build(self) -> MockMediaEngine {
        MockMediaEngine {
            shared: Arc::new(EngineShared {
                spawn_attempts: AtomicUsize::new(0),
                fail_spawn_at: self.fail_spawn_at,
                fail_all_spawns: AtomicBool::new(self.fail_all_spawns),
                fail_router_creation: AtomicBool::new(self.fail_router_creation),
                fail_closes: AtomicBool::new(self.fail_closes),
                router_gate: self.hold_router_creation.then(|| Semaphore::new(0)),
                close_gate: self.hold_closes.then(|| Semaphore::new(0)),
                held_closes: AtomicUsize::new(0),
                next_pid: AtomicU32::new(FIRST_MOCK_PID),
                workers: Mutex::new(Vec::new()),
                journal: Mutex::new(Vec::new()),
            }),
        }
    }
}

struct MockWorker {
    engine: Arc<EngineShared>,
    worker: Arc<WorkerShared>,
}

#[async_trait]
impl MediaWorker for MockWorker {
    fn pid(&self) -> u32 {
        self.worker.pid
    }

    async fn create_router(&self, media_codecs: &[RtpCodecCapability]) -> Result<Arc<dyn MediaRouter>, MediaError> {
        if self.worker.is_dead() {
            return Err(MediaError::WorkerClosed(format!("worker {} is dead", self.worker.pid)));
        }
        if self.engine.fail_router_creation.load(Ordering::SeqCst) {
            return Err(MediaError::Create("injected router creation failure".to_string()));
        }
        if media_codecs.is_empty() {
            return Err(MediaError::InvalidRequest("no media codecs".to_string()));
        }

        // A held request completes even if the worker dies meanwhile.
        if let Some(gate) = &self.engine.router_gate {
            gate.acquire()
                .await
                .expect("router gate closed")
                .forget();
        }

        Ok(Arc::new(MockRouter {
            id: RouterId::new(format!("router-{}", Uuid::new_v4())),
            closed: AtomicBool::new(false),
            engine: Arc::clone(&self.engine),
            worker: Arc::clone(&self.worker),
        }))
    }

    async fn died(&self) {
        self.worker.death.cancelled().await;
    }
}

struct MockRouter {
    id: RouterId,
    closed: AtomicBool,
    engine: Arc<EngineShared>,
    worker: Arc<WorkerShared>,
}

#[async_trait]
impl MediaRouter for MockRouter {
    fn id(&self) -> RouterId {
        self.id.clone()
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.worker.is_dead()
    }

    async fn create_webrtc_transport(
        &self,
        _options: &WebRtcTransportOptions,
    ) -> Result<Arc<dyn MediaTransport>, MediaError> {
        if self.closed() {
            return Err(MediaError::InvalidRequest(format!("router {} is closed", self.id)));
        }

        Ok(Arc::new(MockTransport {
            id: TransportId::new(format!("transport-{}", Uuid::new_v4())),
            closed: AtomicBool::new(false),
            engine: Arc::clone(&self.engine),
            worker: Arc::clone(&self.worker),
        }))
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.engine.pass_close_gate().await;
        self.engine
            .close(ObjectKind::Router, self.id.as_str(), &self.worker, &self.closed)
    }
}

struct MockTransport {
    id: TransportId,
    closed: AtomicBool,
    engine: Arc<EngineShared>,
    worker: Arc<WorkerShared>,
}

#[async_trait]
impl MediaTransport for MockTransport {
    fn id(&self) -> TransportId {
        self.id.clone()
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.worker.is_dead()
    }

    async fn produce(&self, options: ProduceOptions) -> Result<Arc<dyn MediaProducer>, MediaError> {
        if self.closed() {
            return Err(MediaError::InvalidRequest(format!("transport {} is closed", self.id)));
        }

        Ok(Arc::new(MockProducer {
            id: ProducerId::new(format!("producer-{}", Uuid::new_v4())),
            kind: options.kind,
            closed: AtomicBool::new(false),
            engine: Arc::clone(&self.engine),
            worker: Arc::clone(&self.worker),
        }))
    }

    async fn consume(&self, options: ConsumeOptions) -> Result<Arc<dyn MediaConsumer>, MediaError> {
        if self.closed() {
            return Err(MediaError::InvalidRequest(format!("transport {} is closed", self.id)));
        }

        let kind = options
            .rtp_capabilities
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .map_or(MediaKind::Video, |k| {
                if k == "audio" {
                    MediaKind::Audio
                } else {
                    MediaKind::Video
                }
            });

        Ok(Arc::new(MockConsumer {
            id: ConsumerId::new(format!("consumer-{}", Uuid::new_v4())),
            producer_id: options.producer_id,
            kind,
            closed: AtomicBool::new(false),
            engine: Arc::clone(&self.engine),
            worker: Arc::clone(&self.worker),
        }))
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.engine.pass_close_gate().await;
        self.engine
            .close(ObjectKind::Transport, self.id.as_str(), &self.worker, &self.closed)
    }
}

struct MockProducer {
    id: ProducerId,
    kind: MediaKind,
    closed: AtomicBool,
    engine: Arc<EngineShared>,
    worker: Arc<WorkerShared>,
}

#[async_trait]
impl MediaProducer for MockProducer {
    fn id(&self) -> ProducerId {
        self.id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.worker.is_dead()
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.engine.pass_close_gate().await;
        self.engine
            .close(ObjectKind::Producer, self.id.as_str(), &self.worker, &self.closed)
    }
}

struct MockConsumer {
    id: ConsumerId,
    producer_id: ProducerId,
    kind: MediaKind,
    closed: AtomicBool,
    engine: Arc<EngineShared>,
    worker: Arc<WorkerShared>,
}

#[async_trait]
impl MediaConsumer for MockConsumer {
    fn id(&self) -> ConsumerId {
        self.id.clone()
    }

    fn producer_id(&self) -> ProducerId {
        self.producer_id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.worker.is_dead()
    }

    async fn close(&self) -> Result<(), MediaError> {
        self.engine.pass_close_gate().await;
        self.engine
            .close(ObjectKind::Consumer, self.id.as_str(), &self.worker, &self.closed)
    }
}
