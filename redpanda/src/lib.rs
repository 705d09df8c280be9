//! Kafka-compatible event bus for the todoflow mutation pipeline.
//!
//! Implements the [`EventBus`] trait from `todoflow-core` using rdkafka, so
//! any Kafka-protocol broker (Redpanda, Apache Kafka, managed equivalents)
//! can carry the `todo` topic.
//!
//! # Delivery semantics
//!
//! **At-least-once** with manual offset commits on the consumer side:
//!
//! - A publish resolves only after the broker acknowledges the record, so a
//!   successful publish has left the process boundary.
//! - Offsets are committed only after an event has been handed to the
//!   subscriber's channel; a crash before commit means redelivery.
//! - Subscribing under a consumer group makes the broker deliver each event
//!   to exactly one member of the group, which is what prevents duplicate
//!   notifications when several broadcaster replicas run concurrently.
//!
//! Records are keyed by the todo id, so events for the same todo land in
//! the same partition and keep their relative order. There is no retry on
//! the publish path: a failed send is reported once and the caller decides
//! (the service layer logs and swallows it).
//!
//! # Example
//!
//! ```no_run
//! use todoflow_redpanda::RedpandaEventBus;
//! use todoflow_core::{EventBus, MutationEvent, TODO_TOPIC};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = RedpandaEventBus::new("localhost:9092")?;
//!
//! bus.publish(TODO_TOPIC, &MutationEvent::created(1)).await?;
//!
//! let mut stream = bus.subscribe(TODO_TOPIC, "todo-notifiers").await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(event) => println!("todo {} {:?}", event.id, event.operation),
//!         Err(e) => eprintln!("stream error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use todoflow_core::{EventBus, EventBusError, EventStream, MutationEvent};

/// Kafka-compatible implementation of [`EventBus`].
///
/// Holds one shared producer for the lifetime of the process. The original
/// deployment opened a fresh bus connection per publish; a shared producer
/// keeps the same observable contract (one acknowledged send per publish,
/// failures reported once) without the per-call connection cost.
pub struct RedpandaEventBus {
    /// Shared producer for publishing events.
    producer: FutureProducer,
    /// Broker addresses, kept for creating consumers.
    brokers: String,
    /// Producer send timeout.
    timeout: Duration,
    /// Event buffer size for subscribers.
    buffer_size: usize,
    /// Auto offset reset policy for new consumer groups.
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Create a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot
    /// be created from the given broker list.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Broker addresses this bus connects to.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1", or "all".
    ///
    /// Default: "1".
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// This is the only deadline on the publish path; an unresponsive
    /// broker fails the publish after this long instead of stalling the
    /// request indefinitely. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the event buffer size between the consumer task and the
    /// subscriber stream. Default: 1000.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is 0.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        assert!(buffer_size > 0, "buffer_size must be greater than 0");
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Set where new consumer groups start reading: "earliest", "latest",
    /// or "error". Default: "latest".
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set
    /// or the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::ConnectionFailed("brokers not configured".to_string()))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let acks = self.producer_acks.as_deref().unwrap_or("1");

        let producer: FutureProducer =
            producer_config(&brokers, acks, timeout).create().map_err(|e| {
                EventBusError::ConnectionFailed(format!("failed to create producer: {e}"))
            })?;

        tracing::info!(
            brokers = %brokers,
            acks = acks,
            timeout_ms = timeout.as_millis(),
            auto_offset_reset = self.auto_offset_reset.as_deref().unwrap_or("latest"),
            "Redpanda event bus created"
        );

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout,
            buffer_size: self.buffer_size.unwrap_or(1000),
            auto_offset_reset: self.auto_offset_reset.unwrap_or_else(|| "latest".to_string()),
        })
    }
}

/// Producer configuration shared between `build` and its tests.
///
/// `message.timeout.ms` is derived from the same timeout that bounds the
/// `send` await, so librdkafka's internal delivery deadline never expires
/// earlier than the deadline the caller configured.
fn producer_config(brokers: &str, acks: &str, timeout: Duration) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", brokers)
        .set("message.timeout.ms", timeout.as_millis().to_string())
        .set("acks", acks);
    config
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &MutationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = *event;
        let timeout = self.timeout;

        Box::pin(async move {
            let payload = event.to_payload().map_err(|e| EventBusError::PublishFailed {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;

            // Key by todo id: events for the same todo share a partition,
            // which gives best-effort per-id ordering.
            let key = event.id.to_be_bytes();
            let record = FutureRecord::to(&topic).payload(&payload).key(&key[..]);

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition = partition,
                        offset = offset,
                        todo_id = event.id,
                        operation = event.operation.as_str(),
                        "Event published"
                    );
                    metrics::counter!("todo_bus.published").increment(1);
                    Ok(())
                },
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %topic,
                        todo_id = event.id,
                        error = %kafka_error,
                        "Failed to publish event"
                    );
                    metrics::counter!("todo_bus.publish_failed").increment(1);
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                },
            }
        })
    }

    fn subscribe(
        &self,
        topic: &str,
        group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let group = group.to_string();
        let brokers = self.brokers.clone();
        let buffer_size = self.buffer_size;
        let auto_offset_reset = self.auto_offset_reset.clone();

        Box::pin(async move {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &group)
                .set("enable.auto.commit", "false") // Manual commit for at-least-once
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: vec![topic.clone()],
                    reason: format!("failed to create consumer: {e}"),
                })?;

            consumer
                .subscribe(&[topic.as_str()])
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: vec![topic.clone()],
                    reason: format!("failed to subscribe: {e}"),
                })?;

            tracing::info!(
                topic = %topic,
                consumer_group = %group,
                "Subscribed to topic"
            );

            let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

            // The spawned task owns the consumer and forwards decoded
            // events. Offsets are committed only after the event reaches
            // the channel; malformed payloads are forwarded as in-stream
            // errors and committed so they are not redelivered.
            tokio::spawn(async move {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut stream = consumer.stream();

                while let Some(msg_result) = stream.next().await {
                    match msg_result {
                        Ok(message) => {
                            let event_result = match message.payload() {
                                Some(payload) => MutationEvent::from_payload(payload),
                                None => Err(EventBusError::DecodeFailed(
                                    "message has no payload".to_string(),
                                )),
                            };

                            if tx.send(event_result).await.is_err() {
                                // Receiver dropped; exit without committing.
                                break;
                            }

                            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                                tracing::warn!(
                                    topic = message.topic(),
                                    offset = message.offset(),
                                    error = %e,
                                    "Failed to commit offset (message may be redelivered)"
                                );
                            }
                        },
                        Err(e) => {
                            let err = EventBusError::Transport(format!(
                                "failed to receive message: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                        },
                    }
                }

                tracing::debug!("Consumer task exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}
