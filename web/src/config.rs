//! Web service configuration.
//!
//! Values come from the environment with local-development defaults, the
//! same knobs the deployed service is driven by.

use std::env;

/// Startup configuration for the web service.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection URL (`DATABASE_URL`).
    pub database_url: String,
    /// Comma-separated bus broker addresses (`KAFKA_BROKERS`).
    pub kafka_brokers: String,
    /// HTTP listen port (`PORT`).
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment, falling back to
    /// local-development defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://postgres@localhost/postgres".to_string()),
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5005),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
