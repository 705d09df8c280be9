//! Consumer-group notification worker for the todoflow mutation pipeline.
//!
//! One broadcaster process subscribes to the `todo` topic under the
//! `todo-notifiers` consumer group. With N replicas running, the bus
//! delivers each published event to exactly one of them, which is the
//! mechanism preventing duplicate external notifications.
//!
//! Per received event:
//!
//! - malformed payloads are logged and dropped (no dead-letter, no
//!   redelivery request) and the loop continues;
//! - decoded events are forwarded to the notification sink only when the
//!   process runs in the production execution context *and* a sink is
//!   configured, otherwise skipped at debug level;
//! - sink failures are logged, never propagated.
//!
//! Bus connect/subscribe failure at startup is fatal: there is no
//! reconnect loop, the supervisor restarts the process.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod sink;

pub use config::{probe_is_production, Config, CONSUMER_GROUP, DEFAULT_PROBE_PATH};
pub use sink::{NotificationSink, SinkError, WebhookSink};

use futures::StreamExt;
use std::sync::Arc;
use todoflow_core::{EventBusError, EventStream, MutationEvent};

/// Title attached to every forwarded notification.
pub const NOTIFY_TITLE: &str = "A todo item changed";

/// The broadcast loop: consumes an event stream and conditionally forwards
/// notifications.
pub struct Broadcaster {
    production: bool,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl Broadcaster {
    /// Create a broadcaster.
    ///
    /// `production` is the startup-resolved execution context flag; `sink`
    /// is the configured notification target, if any.
    #[must_use]
    pub fn new(production: bool, sink: Option<Arc<dyn NotificationSink>>) -> Self {
        if sink.is_none() {
            tracing::error!("No notification sink configured, notifications disabled");
        }
        Self { production, sink }
    }

    /// Consume the stream until it ends.
    ///
    /// In-stream errors (decode failures, transport hiccups) never
    /// terminate the loop; only stream exhaustion does.
    pub async fn run(&self, mut events: EventStream) {
        tracing::info!(
            production = self.production,
            sink_configured = self.sink.is_some(),
            "Broadcaster consuming"
        );

        while let Some(result) = events.next().await {
            match result {
                Ok(event) => self.handle_event(event).await,
                Err(EventBusError::DecodeFailed(reason)) => {
                    tracing::warn!(reason = %reason, "Dropping malformed event payload");
                    metrics::counter!("todo_broadcaster.dropped_payloads").increment(1);
                },
                Err(e) => {
                    tracing::error!(error = %e, "Event stream error");
                },
            }
        }

        tracing::info!("Event stream ended, broadcaster exiting");
    }

    /// Forward one decoded event, honoring the production/sink gate.
    async fn handle_event(&self, event: MutationEvent) {
        tracing::debug!(
            todo_id = event.id,
            operation = event.operation.as_str(),
            "Received event"
        );

        let sink = match (&self.sink, self.production) {
            (Some(sink), true) => sink,
            _ => {
                tracing::debug!(
                    todo_id = event.id,
                    "Skipping notification (not production or no sink)"
                );
                return;
            },
        };

        // Body is the canonical wire form of the event, matching what a
        // bus observer would see.
        let body = match event.to_payload() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to re-encode event for notification");
                return;
            },
        };

        if let Err(e) = sink.notify(NOTIFY_TITLE, &body).await {
            tracing::error!(
                todo_id = event.id,
                error = %e,
                "Notification send failed"
            );
            metrics::counter!("todo_broadcaster.notify_failed").increment(1);
        } else {
            metrics::counter!("todo_broadcaster.notified").increment(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use todoflow_core::{EventBus, TODO_TOPIC};
    use todoflow_testing::InMemoryEventBus;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(
            &self,
            title: &str,
            body: &str,
        ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
            let entry = (title.to_string(), body.to_string());
            Box::pin(async move {
                if self.fail {
                    return Err(SinkError::SendFailed("recording sink failure".to_string()));
                }
                self.sent.lock().unwrap().push(entry);
                Ok(())
            })
        }
    }

    /// Subscribe, feed the bus, drop it so the stream ends, then run the
    /// loop to completion.
    async fn run_with_events(
        broadcaster: &Broadcaster,
        feed: impl FnOnce(&InMemoryEventBus),
    ) {
        let bus = InMemoryEventBus::new();
        let stream = bus.subscribe(TODO_TOPIC, CONSUMER_GROUP).await.unwrap();
        feed(&bus);
        drop(bus);
        broadcaster.run(stream).await;
    }

    #[tokio::test]
    async fn production_with_sink_forwards_payload_as_body() {
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(true, Some(sink.clone()));

        run_with_events(&broadcaster, |bus| {
            bus.publish_raw(TODO_TOPIC, br#"{"id":1,"operation":"created"}"#);
        })
        .await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, NOTIFY_TITLE);
        let body: serde_json::Value = serde_json::from_str(&sent[0].1).unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["operation"], "created");
    }

    #[tokio::test]
    async fn non_production_is_a_silent_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(false, Some(sink.clone()));

        run_with_events(&broadcaster, |bus| {
            bus.publish_raw(TODO_TOPIC, br#"{"id":1,"operation":"created"}"#);
        })
        .await;

        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_sink_is_a_no_op_even_in_production() {
        let broadcaster = Broadcaster::new(true, None);

        // Must not panic or error with no sink configured.
        run_with_events(&broadcaster, |bus| {
            bus.publish_raw(TODO_TOPIC, br#"{"id":1,"operation":"updated"}"#);
        })
        .await;
    }

    #[tokio::test]
    async fn malformed_payloads_are_dropped_and_the_loop_continues() {
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(true, Some(sink.clone()));

        run_with_events(&broadcaster, |bus| {
            bus.publish_raw(TODO_TOPIC, b"not json at all");
            bus.publish_raw(TODO_TOPIC, br#"{"id":2,"operation":"updated"}"#);
        })
        .await;

        // The valid message after the malformed one was still delivered.
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("\"id\":2"));
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_the_loop() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let broadcaster = Broadcaster::new(true, Some(sink.clone()));

        run_with_events(&broadcaster, |bus| {
            bus.publish_raw(TODO_TOPIC, br#"{"id":1,"operation":"created"}"#);
            bus.publish_raw(TODO_TOPIC, br#"{"id":2,"operation":"created"}"#);
        })
        .await;

        // Both sends failed and were swallowed; nothing recorded, no panic.
        assert!(sink.sent().is_empty());
    }
}
