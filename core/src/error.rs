//! Error taxonomy for todo operations.
//!
//! Primary-path failures (the store) abort the request and are surfaced to
//! the caller. Secondary-path failures (publish, notification sink) are
//! logged and swallowed; they live in
//! [`EventBusError`](crate::event_bus::EventBusError) instead.

use thiserror::Error;

/// Errors surfaced by todo operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Bad input; the client's fault, retrying is useless.
    #[error("validation failed: {reason}")]
    Validation {
        /// Why the input was rejected.
        reason: String,
    },

    /// The backing store is unreachable; retryable by the caller.
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// The underlying cause.
        reason: String,
    },

    /// No row with the given id. A normal negative result, not a fault.
    #[error("todo {id} not found")]
    NotFound {
        /// The id that was looked up.
        id: i64,
    },
}
