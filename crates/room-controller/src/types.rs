//! Identifier types shared by the worker pool, the registry and the media contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool-issued identifier for a media worker.
///
/// Ids increase monotonically for the lifetime of a pool; a replacement worker
/// always receives a fresh id, so a dead worker's id is never handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Client-chosen identifier of a meeting room.
    RoomId
);

string_id!(
    /// Media-engine-issued router identifier.
    RouterId
);

string_id!(
    /// Media-engine-issued transport identifier.
    TransportId
);

string_id!(
    /// Media-engine-issued producer identifier.
    ProducerId
);

string_id!(
    /// Media-engine-issued consumer identifier.
    ConsumerId
);

/// Signaling session identifier of a connected participant.
pub type SessionId = String;
