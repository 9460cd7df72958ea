//! # RC Test Utilities
//!
//! Shared test utilities for the Room Controller.
//!
//! This crate provides a mock media engine and test fixtures for isolated
//! Room Controller testing without real media worker processes.
//!
//! ## Modules
//!
//! - `mock_engine` - In-process media engine with failure injection
//! - `fixtures` - Configurations, rooms, sinks and media helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let engine = MockMediaEngine::default();
//!     let sink = Arc::new(RecordingSink::new());
//!     let controller = RoomController::start(engine.as_engine(), &test_config(2), sink)
//!         .await
//!         .unwrap();
//!
//!     let room = TestRoom::new("standup").create_in(&controller.registry()).await.unwrap();
//!     let media = open_media(&controller.registry(), &room.id).await;
//!
//!     engine.kill_worker(engine.worker_pids()[0]);
//! }
//! ```

pub mod fixtures;
pub mod mock_engine;

pub use fixtures::*;
pub use mock_engine::*;
