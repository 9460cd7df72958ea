//! `RoomController` - owns the worker pool and room registry of one instance.
//!
//! - Initializes the `WorkerPool` (fatal if no worker starts)
//! - Constructs the `RoomRegistry` on top of it
//! - Runs the single consumer of the pool's death channel, which ends every
//!   room hosted on a dead worker
//!
//! # Graceful Shutdown
//!
//! `shutdown`:
//! 1. Marks health as draining and stops accepting new rooms
//! 2. Cancels the death listener and the pool's watcher/replacement tasks
//! 3. Tears down every remaining room in the usual order

use crate::config::Config;
use crate::errors::RcError;
use crate::media::MediaEngine;
use crate::observability::HealthState;
use crate::rooms::{RegistryConfig, RoomEventSink, RoomRegistry};
use crate::workers::{WorkerDeath, WorkerPool, WorkerPoolConfig};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Status snapshot of a controller instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub rc_id: String,
    pub workers: usize,
    pub rooms: usize,
    pub transports: usize,
    pub producers: usize,
    pub consumers: usize,
    pub accepting_new: bool,
}

/// One room controller instance.
pub struct RoomController {
    rc_id: String,
    pool: Arc<WorkerPool>,
    registry: Arc<RoomRegistry>,
    health: Arc<HealthState>,
    cancel_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RoomController {
    /// Start the pool, build the registry and spawn the death listener.
    ///
    /// Rooms ended by a worker death are reported to `sink` before teardown.
    ///
    /// # Errors
    ///
    /// - `RcError::NoWorkersAvailable` - no worker could be spawned
    #[instrument(skip_all, name = "rc.controller.start", fields(rc_id = %config.rc_id))]
    pub async fn start(
        engine: Arc<dyn MediaEngine>,
        config: &Config,
        sink: Arc<dyn RoomEventSink>,
    ) -> Result<Self, RcError> {
        let health = Arc::new(HealthState::new());

        let (pool, deaths) = WorkerPool::initialize(
            engine,
            WorkerPoolConfig::from(config),
            Arc::clone(&health),
        )
        .await
        .map_err(|e| {
            error!(
                target: "rc.controller",
                rc_id = %config.rc_id,
                error = %e,
                "Room controller failed to start"
            );
            e
        })?;

        let registry = Arc::new(RoomRegistry::new(
            Arc::clone(&pool),
            RegistryConfig::from(config),
        ));

        let cancel_token = CancellationToken::new();
        let listener = tokio::spawn(run_death_listener(
            config.rc_id.clone(),
            Arc::clone(&registry),
            deaths,
            sink,
            cancel_token.child_token(),
        ));

        info!(
            target: "rc.controller",
            rc_id = %config.rc_id,
            workers = pool.len().await,
            "Room controller started"
        );

        Ok(Self {
            rc_id: config.rc_id.clone(),
            pool,
            registry,
            health,
            cancel_token,
            listener: Mutex::new(Some(listener)),
        })
    }

    #[must_use]
    pub fn rc_id(&self) -> &str {
        &self.rc_id
    }

    /// Shared registry handle for the signaling layer.
    #[must_use]
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn pool(&self) -> Arc<WorkerPool> {
        Arc::clone(&self.pool)
    }

    /// Health state backing [`crate::observability::health_router`].
    #[must_use]
    pub fn health(&self) -> Arc<HealthState> {
        Arc::clone(&self.health)
    }

    pub async fn status(&self) -> ControllerStatus {
        let stats = self.registry.stats().await;
        ControllerStatus {
            rc_id: self.rc_id.clone(),
            workers: self.pool.len().await,
            rooms: stats.rooms,
            transports: stats.transports,
            producers: stats.producers,
            consumers: stats.consumers,
            accepting_new: !self.cancel_token.is_cancelled(),
        }
    }

    /// Drain the controller. Safe to call more than once.
    #[instrument(skip_all, name = "rc.controller.shutdown", fields(rc_id = %self.rc_id))]
    pub async fn shutdown(&self) {
        info!(
            target: "rc.controller",
            rc_id = %self.rc_id,
            room_count = self.registry.room_count().await,
            "Performing graceful shutdown"
        );

        self.health.set_draining();
        self.registry.stop_accepting().await;
        self.cancel_token.cancel();
        self.pool.shutdown();

        if let Some(listener) = self.listener.lock().await.take() {
            if let Err(e) = listener.await {
                warn!(
                    target: "rc.controller",
                    rc_id = %self.rc_id,
                    error = ?e,
                    "Death listener task panicked"
                );
            }
        }

        self.registry.remove_all_rooms().await;

        info!(
            target: "rc.controller",
            rc_id = %self.rc_id,
            "Room controller stopped"
        );
    }
}

impl Drop for RoomController {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.pool.shutdown();
    }
}

async fn run_death_listener(
    rc_id: String,
    registry: Arc<RoomRegistry>,
    mut deaths: mpsc::UnboundedReceiver<WorkerDeath>,
    sink: Arc<dyn RoomEventSink>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                break;
            }

            death = deaths.recv() => {
                let Some(death) = death else {
                    break;
                };
                let ended = registry
                    .handle_worker_death(death.worker_id, sink.as_ref())
                    .await;
                info!(
                    target: "rc.controller",
                    rc_id = %rc_id,
                    worker_id = %death.worker_id,
                    pid = death.pid,
                    rooms_ended = ended,
                    "Worker death handled"
                );
            }
        }
    }

    info!(
        target: "rc.controller",
        rc_id = %rc_id,
        "Death listener stopped"
    );
}
