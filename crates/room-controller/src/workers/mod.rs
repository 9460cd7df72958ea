//! Media worker management.

pub mod pool;

pub use pool::{PooledWorker, WorkerDeath, WorkerPool, WorkerPoolConfig};
