//! Event bus abstraction for mutation notifications.
//!
//! This module provides the [`EventBus`] trait for publishing and consuming
//! [`MutationEvent`]s. Events flow from the store (source of truth) through
//! the bus to the broadcaster replicas.
//!
//! # Key principles
//!
//! - **Store first**: rows are committed before the matching event is
//!   published; a publish never precedes its mutation.
//! - **At-least-once, best-effort**: a publish failure is reported once to
//!   the caller and not retried; the service layer logs and swallows it.
//! - **Consumer groups**: subscribing under a group name makes the bus
//!   deliver each event to exactly one member of that group, which is what
//!   keeps N broadcaster replicas from sending duplicate notifications.
//!
//! # Implementations
//!
//! - `RedpandaEventBus` in `todoflow-redpanda` — production, Kafka-compatible.
//! - `InMemoryEventBus` in `todoflow-testing` — fast, in-process, for tests.

use crate::event::MutationEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// Failed to connect to the bus.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to topics.
    #[error("subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe.
        topics: Vec<String>,
        /// The reason for failure.
        reason: String,
    },

    /// A payload could not be decoded. Consumers log and drop the message.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Network or transport error.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Stream of decoded mutation events from a subscription.
///
/// Each item is either a decoded event or an in-stream error (decode
/// failure, transport hiccup). Errors do not terminate the stream; the
/// consumer decides whether to log and continue.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<MutationEvent, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so
/// the trait stays dyn-compatible (`Arc<dyn EventBus>` is how the service
/// layer holds its publisher).
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// The future resolves once the bus has acknowledged the send, i.e. the
    /// event has left the process boundary. There is no retry; a failed
    /// publish is reported exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the send or its
    /// acknowledgement fails.
    fn publish(
        &self,
        topic: &str,
        event: &MutationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to a topic under a consumer group.
    ///
    /// With several subscribers sharing `group`, the bus delivers each
    /// published event to exactly one of them. Distinct groups each receive
    /// every event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topic: &str,
        group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
