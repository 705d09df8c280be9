//! Broadcaster configuration.
//!
//! Resolved once at process startup. The production execution context is
//! probed here and carried as an explicit boolean so the notification gate
//! can be tested without a filesystem fixture.

use std::env;
use std::path::Path;

/// Default probe path: the Kubernetes serviceaccount namespace file.
pub const DEFAULT_PROBE_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// The consumer group shared by all broadcaster replicas.
pub const CONSUMER_GROUP: &str = "todo-notifiers";

/// Startup configuration for the broadcaster.
#[derive(Debug, Clone)]
pub struct Config {
    /// Comma-separated bus broker addresses (`KAFKA_BROKERS`).
    pub kafka_brokers: String,
    /// Notification webhook URL (`WEBHOOK_URL`); `None` disables the sink.
    pub webhook_url: Option<String>,
    /// Whether this process runs in the production execution context.
    pub production: bool,
}

impl Config {
    /// Read configuration from the environment and resolve the production
    /// probe (`PRODUCTION_PROBE_PATH` overrides the default path).
    #[must_use]
    pub fn from_env() -> Self {
        let probe_path = env::var("PRODUCTION_PROBE_PATH")
            .unwrap_or_else(|_| DEFAULT_PROBE_PATH.to_string());

        Self {
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            webhook_url: env::var("WEBHOOK_URL").ok().filter(|url| !url.is_empty()),
            production: probe_is_production(Path::new(&probe_path)),
        }
    }
}

/// Resolve the production context from a well-known local file.
///
/// The file holds the execution namespace; "production" enables notification
/// forwarding. An absent or unreadable file means "not production" and is
/// not an error.
#[must_use]
pub fn probe_is_production(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(namespace) => namespace.trim() == "production",
        Err(_) => false,
    }
}
