//! Rooms and the media objects they own.

pub mod registry;
pub mod room;

pub use registry::{RegistryConfig, RegistryStats, RoomEventSink, RoomRegistry};
pub use room::{ChatMessage, Participant, RoomSnapshot};
