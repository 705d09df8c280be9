//! Todoflow broadcaster process.
//!
//! # Usage
//!
//! ```bash
//! KAFKA_BROKERS=localhost:9092 \
//! WEBHOOK_URL=https://hooks.example.com/todo \
//!   cargo run --bin todoflow-broadcaster
//! ```
//!
//! Bus connect/subscribe failure at startup exits the process; run it
//! under a supervisor.

use std::sync::Arc;
use todoflow_broadcaster::{Broadcaster, Config, NotificationSink, WebhookSink, CONSUMER_GROUP};
use todoflow_core::{EventBus, TODO_TOPIC};
use todoflow_redpanda::RedpandaEventBus;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    info!(
        brokers = %config.kafka_brokers,
        production = config.production,
        "Starting todoflow broadcaster"
    );

    let sink: Option<Arc<dyn NotificationSink>> = config.webhook_url.as_ref().map(|url| {
        info!(url = %truncate(url, 32), "Notifications enabled");
        Arc::new(WebhookSink::new(url.clone())) as Arc<dyn NotificationSink>
    });

    // Startup bus failure is fatal by design: no reconnect loop here.
    let bus = RedpandaEventBus::new(&config.kafka_brokers)?;
    let events = bus.subscribe(TODO_TOPIC, CONSUMER_GROUP).await?;

    Broadcaster::new(config.production, sink).run(events).await;

    Ok(())
}

fn truncate(s: &str, max: usize) -> &str {
    let end = s
        .char_indices()
        .nth(max)
        .map_or(s.len(), |(idx, _)| idx);
    &s[..end]
}
