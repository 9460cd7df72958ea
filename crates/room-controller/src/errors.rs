//! Room Controller error types.
//!
//! Error types map to signaling `ErrorCode` values for client responses.
//! Internal details are logged server-side but not exposed to clients.

use crate::config::ConfigError;
use crate::media::MediaError;
use crate::types::RoomId;
use thiserror::Error;

/// Room Controller error type.
///
/// Maps to signaling `ErrorCode` values:
/// - `RoomNotFound`, `ParticipantNotFound`: `NOT_FOUND` (4)
/// - `IdAlreadyExists`: `CONFLICT` (5)
/// - `MediaEngine`, `Config`: `INTERNAL_ERROR` (6)
/// - `NoWorkersAvailable`, `Draining`: `CAPACITY_EXCEEDED` (7)
#[derive(Debug, Error)]
pub enum RcError {
    /// A room with this id is already registered.
    #[error("Room already exists: {0}")]
    IdAlreadyExists(RoomId),

    /// The worker pool is empty.
    #[error("No media workers available")]
    NoWorkersAvailable,

    /// A create or close call against the media engine failed.
    #[error("Media engine error: {0}")]
    MediaEngine(#[from] MediaError),

    /// Room not found.
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// Participant not found in the addressed room.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// The controller is shutting down and no longer creates rooms.
    #[error("Room controller is draining")]
    Draining,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RcError {
    /// Returns the signaling `ErrorCode` value for this error.
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match self {
            RcError::RoomNotFound(_) | RcError::ParticipantNotFound(_) => 4, // NOT_FOUND
            RcError::IdAlreadyExists(_) => 5,                                // CONFLICT
            RcError::MediaEngine(_) | RcError::Config(_) => 6,               // INTERNAL_ERROR
            RcError::NoWorkersAvailable | RcError::Draining => 7,            // CAPACITY_EXCEEDED
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            RcError::IdAlreadyExists(_) => "A room with this id already exists".to_string(),
            RcError::NoWorkersAvailable => {
                "No media capacity available, please try again".to_string()
            }
            RcError::MediaEngine(_) | RcError::Config(_) => {
                "An internal error occurred".to_string()
            }
            RcError::RoomNotFound(_) => "Room not found".to_string(),
            RcError::ParticipantNotFound(_) => "Participant not found".to_string(),
            RcError::Draining => "Server is shutting down, please reconnect".to_string(),
        }
    }
}

impl From<ConfigError> for RcError {
    fn from(err: ConfigError) -> Self {
        RcError::Config(err.to_string())
    }
}
