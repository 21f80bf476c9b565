//! Newtype identifiers.
//!
//! Only one identity is generated by the core itself: the [`DispatchId`] that
//! tags every dispatch span so the request build, client resolution, transport
//! call, and decode of a single call can be correlated in logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single dispatch (one call through the orchestrator).
///
/// Generated fresh for every dispatch; recorded on the `dispatch` tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchId(Uuid);

impl DispatchId {
    /// Generates a new random dispatch identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`DispatchId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DispatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
