//! Notification sinks.
//!
//! A sink is an opaque one-way `(title, body)` send. Sink failures are
//! logged by the broadcast loop and never propagated further; losing a
//! notification is accepted, failing the consume loop is not.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from a notification send.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink endpoint rejected or never received the send.
    #[error("notification send failed: {0}")]
    SendFailed(String),
}

/// One-way notification target.
pub trait NotificationSink: Send + Sync {
    /// Send a notification. The caller logs failures and moves on.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::SendFailed`] if the send did not reach the
    /// sink endpoint.
    fn notify(
        &self,
        title: &str,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>>;
}

/// Sink that POSTs `{"title", "body"}` JSON to a configured webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Create a sink for the given webhook URL.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl NotificationSink for WebhookSink {
    fn notify(
        &self,
        title: &str,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        // Owned payload: the future must not borrow the caller's strings.
        let payload = serde_json::json!({ "title": title, "body": body });

        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| SinkError::SendFailed(e.to_string()))?;

            response
                .error_for_status()
                .map_err(|e| SinkError::SendFailed(e.to_string()))?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_sink_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<WebhookSink>();
        assert_sync::<WebhookSink>();
    }
}
