//! The opaque event key handle.

use serde::{Deserialize, Serialize};

/// A handle to a scheduled event, issued by the engine when an event is
/// scheduled with a key and consumed by cancellation.
///
/// The key's content is meaningful only to the engine: the client never
/// synthesizes one and cannot inspect it, only compare and send it back.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey(#[serde(with = "serde_bytes")] Vec<u8>);

#[cfg(test)]
impl EventKey {
    fn from_raw(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl std::fmt::Debug for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventKey(..)")
    }
}
