//! Mutation events published after successful store commits.
//!
//! A [`MutationEvent`] is ephemeral: it exists only on the bus, is emitted
//! only after the corresponding row has durably committed, and is consumed
//! at most once per active consumer group. The wire form is the compact
//! JSON record `{"id": <integer>, "operation": "created"|"updated"}`.

use crate::event_bus::EventBusError;
use serde::{Deserialize, Serialize};

/// The single well-known topic mutation events are published to.
pub const TODO_TOPIC: &str = "todo";

/// The kind of mutation a [`MutationEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A todo row was inserted.
    Created,
    /// A todo row transitioned to done.
    Updated,
}

impl Operation {
    /// Wire-format string for this operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// A notification that a todo mutation committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// The affected todo's id.
    pub id: i64,
    /// Which mutation happened.
    pub operation: Operation,
}

impl MutationEvent {
    /// Event for a freshly created todo.
    #[must_use]
    pub const fn created(id: i64) -> Self {
        Self {
            id,
            operation: Operation::Created,
        }
    }

    /// Event for a todo marked done.
    #[must_use]
    pub const fn updated(id: i64) -> Self {
        Self {
            id,
            operation: Operation::Updated,
        }
    }

    /// Encode to the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::DecodeFailed`] if serialization fails, which
    /// cannot happen for well-formed events but is propagated rather than
    /// panicking.
    pub fn to_payload(&self) -> Result<Vec<u8>, EventBusError> {
        serde_json::to_vec(self).map_err(|e| EventBusError::DecodeFailed(e.to_string()))
    }

    /// Decode from the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::DecodeFailed`] for malformed payloads.
    /// Consumers drop such messages after logging; there is no dead-letter
    /// path for this topic.
    pub fn from_payload(payload: &[u8]) -> Result<Self, EventBusError> {
        serde_json::from_slice(payload).map_err(|e| EventBusError::DecodeFailed(e.to_string()))
    }
}
