//! `WorkerPool` - fixed set of media workers shared by all rooms.
//!
//! - Spawns the configured number of workers at startup; individual spawn
//!   failures are skipped, an empty pool is fatal
//! - Hands workers out round robin, one per new room
//! - Watches every worker for death, reports it on the death channel, drops it
//!   from rotation and schedules one replacement after a fixed backoff
//!
//! # Death Notification
//!
//! The pool owns the sending half of an unbounded channel created at
//! construction. The receiving half goes to exactly one consumer (the room
//! registry's listener). A death notice is sent *before* the worker leaves the
//! rotation, and both happen under the pool lock, so no `select_worker` call
//! can observe the dead worker after its notice exists.

use crate::config::Config;
use crate::errors::RcError;
use crate::media::{MediaEngine, MediaError, MediaWorker, WorkerSettings};
use crate::observability::metrics;
use crate::observability::HealthState;
use crate::types::WorkerId;

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Notice that a worker process died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerDeath {
    pub worker_id: WorkerId,
    pub pid: u32,
}

/// Pool sizing and spawn parameters.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub settings: WorkerSettings,
    pub replacement_backoff: Duration,
}

impl From<&Config> for WorkerPoolConfig {
    fn from(config: &Config) -> Self {
        Self {
            worker_count: config.worker_count,
            settings: config.worker_settings(),
            replacement_backoff: config.worker_replacement_backoff,
        }
    }
}

/// A worker handle together with its pool identity.
#[derive(Clone)]
pub struct PooledWorker {
    id: WorkerId,
    pid: u32,
    handle: Arc<dyn MediaWorker>,
}

impl PooledWorker {
    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.id
    }

    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    #[must_use]
    pub fn handle(&self) -> &Arc<dyn MediaWorker> {
        &self.handle
    }
}

impl fmt::Debug for PooledWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledWorker")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Round-robin rotation over the live workers.
#[derive(Default)]
struct PoolState {
    workers: Vec<PooledWorker>,
    cursor: usize,
    next_id: u64,
}

impl PoolState {
    fn select(&mut self) -> Option<PooledWorker> {
        let len = self.workers.len();
        if len == 0 {
            return None;
        }
        let index = self.cursor % len;
        self.cursor = (index + 1) % len;
        self.workers.get(index).cloned()
    }

    fn insert(&mut self, pid: u32, handle: Arc<dyn MediaWorker>) -> PooledWorker {
        let worker = PooledWorker {
            id: WorkerId(self.next_id),
            pid,
            handle,
        };
        self.next_id += 1;
        self.workers.push(worker.clone());
        worker
    }

    /// Remove a worker, keeping the cursor on the worker that was next in line.
    fn remove(&mut self, worker_id: WorkerId) -> Option<PooledWorker> {
        let position = self.workers.iter().position(|w| w.id == worker_id)?;
        let worker = self.workers.remove(position);
        if position < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.workers.len() {
            self.cursor = 0;
        }
        Some(worker)
    }
}

/// The worker pool.
pub struct WorkerPool {
    engine: Arc<dyn MediaEngine>,
    config: WorkerPoolConfig,
    state: Mutex<PoolState>,
    death_tx: mpsc::UnboundedSender<WorkerDeath>,
    health: Arc<HealthState>,
    cancel_token: CancellationToken,
}

impl WorkerPool {
    /// Spawn `config.worker_count` workers sequentially.
    ///
    /// Returns the pool and the receiving half of its death channel.
    ///
    /// # Errors
    ///
    /// - `RcError::NoWorkersAvailable` - every spawn attempt failed
    #[instrument(skip_all, name = "rc.worker_pool.initialize", fields(worker_count = config.worker_count))]
    pub async fn initialize(
        engine: Arc<dyn MediaEngine>,
        config: WorkerPoolConfig,
        health: Arc<HealthState>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<WorkerDeath>), RcError> {
        let (death_tx, death_rx) = mpsc::unbounded_channel();
        let worker_count = config.worker_count;

        let pool = Arc::new(Self {
            engine,
            config,
            state: Mutex::new(PoolState::default()),
            death_tx,
            health,
            cancel_token: CancellationToken::new(),
        });

        for attempt in 0..worker_count {
            if let Err(e) = pool.spawn_worker().await {
                warn!(
                    target: "rc.worker_pool",
                    attempt,
                    error = %e,
                    "Worker spawn failed, continuing with remaining workers"
                );
            }
        }

        let spawned = pool.len().await;
        if spawned == 0 {
            error!(
                target: "rc.worker_pool",
                requested = worker_count,
                "No media workers could be spawned"
            );
            pool.shutdown();
            return Err(RcError::NoWorkersAvailable);
        }

        info!(
            target: "rc.worker_pool",
            requested = worker_count,
            spawned,
            "Worker pool initialized"
        );

        Ok((pool, death_rx))
    }

    /// Pick the next worker in rotation.
    ///
    /// # Errors
    ///
    /// - `RcError::NoWorkersAvailable` - the pool is empty
    pub async fn select_worker(&self) -> Result<PooledWorker, RcError> {
        let worker = self
            .state
            .lock()
            .await
            .select()
            .ok_or(RcError::NoWorkersAvailable)?;

        debug!(
            target: "rc.worker_pool",
            worker_id = %worker.id,
            pid = worker.pid,
            "Selected worker"
        );

        Ok(worker)
    }

    /// Handle the death of a worker.
    ///
    /// Sends the death notice, drops the worker from rotation and schedules a
    /// replacement. A second call for the same worker is a no-op.
    #[instrument(skip_all, name = "rc.worker_pool.worker_died", fields(worker_id = %worker_id))]
    pub async fn on_worker_died(self: &Arc<Self>, worker_id: WorkerId) {
        let remaining = {
            let mut state = self.state.lock().await;

            let Some(pid) = state
                .workers
                .iter()
                .find(|w| w.id == worker_id)
                .map(|w| w.pid)
            else {
                debug!(
                    target: "rc.worker_pool",
                    worker_id = %worker_id,
                    "Worker already removed from pool"
                );
                return;
            };

            error!(
                target: "rc.worker_pool",
                worker_id = %worker_id,
                pid,
                "Media worker died"
            );

            if self.death_tx.send(WorkerDeath { worker_id, pid }).is_err() {
                warn!(
                    target: "rc.worker_pool",
                    worker_id = %worker_id,
                    "No death listener registered, rooms on this worker will not be cleaned up"
                );
            }

            state.remove(worker_id);
            state.workers.len()
        };

        metrics::record_worker_death();
        metrics::set_workers_active(remaining);
        self.health.set_worker_count(remaining);

        info!(
            target: "rc.worker_pool",
            worker_id = %worker_id,
            remaining,
            backoff_ms = self.config.replacement_backoff.as_millis(),
            "Worker removed from pool, replacement scheduled"
        );

        self.schedule_replacement(worker_id);
    }

    pub async fn contains(&self, worker_id: WorkerId) -> bool {
        self.state
            .lock()
            .await
            .workers
            .iter()
            .any(|w| w.id == worker_id)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.workers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of the workers currently in rotation, in rotation order.
    pub async fn worker_ids(&self) -> Vec<WorkerId> {
        self.state
            .lock()
            .await
            .workers
            .iter()
            .map(PooledWorker::id)
            .collect()
    }

    /// Stop liveness watchers and cancel pending replacements.
    ///
    /// Workers themselves are left to the media engine.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn spawn_worker(self: &Arc<Self>) -> Result<WorkerId, MediaError> {
        let handle = self.engine.create_worker(&self.config.settings).await?;

        if self.cancel_token.is_cancelled() {
            return Err(MediaError::WorkerSpawn("worker pool is shut down".to_string()));
        }

        let pid = handle.pid();
        let (worker, pool_size) = {
            let mut state = self.state.lock().await;
            let worker = state.insert(pid, handle);
            (worker, state.workers.len())
        };

        metrics::set_workers_active(pool_size);
        self.health.set_worker_count(pool_size);

        info!(
            target: "rc.worker_pool",
            worker_id = %worker.id,
            pid,
            pool_size,
            "Media worker spawned"
        );

        let worker_id = worker.id;
        self.watch(worker);
        Ok(worker_id)
    }

    fn watch(self: &Arc<Self>, worker: PooledWorker) {
        let pool: Weak<Self> = Arc::downgrade(self);
        let token = self.cancel_token.child_token();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = worker.handle.died() => {
                    if let Some(pool) = pool.upgrade() {
                        pool.on_worker_died(worker.id).await;
                    }
                }
            }
        });
    }

    fn schedule_replacement(self: &Arc<Self>, dead_worker_id: WorkerId) {
        let pool: Weak<Self> = Arc::downgrade(self);
        let token = self.cancel_token.child_token();
        let backoff = self.config.replacement_backoff;

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(backoff) => {
                    if let Some(pool) = pool.upgrade() {
                        pool.spawn_replacement(dead_worker_id).await;
                    }
                }
            }
        });
    }

    async fn spawn_replacement(self: &Arc<Self>, dead_worker_id: WorkerId) {
        match self.spawn_worker().await {
            Ok(worker_id) => {
                metrics::record_worker_replacement("success");
                info!(
                    target: "rc.worker_pool",
                    replaced = %dead_worker_id,
                    worker_id = %worker_id,
                    "Replacement worker spawned"
                );
            }
            Err(e) => {
                metrics::record_worker_replacement("error");
                warn!(
                    target: "rc.worker_pool",
                    replaced = %dead_worker_id,
                    error = %e,
                    "Replacement worker spawn failed, pool runs degraded"
                );
            }
        }
    }
}
