//! Todoflow web service.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://postgres@localhost/postgres \
//! KAFKA_BROKERS=localhost:9092 \
//! PORT=5005 \
//!   cargo run --bin todoflow-web
//! ```

use std::sync::Arc;
use todoflow_core::{EventBus, TodoRepository};
use todoflow_postgres::PostgresTodoStore;
use todoflow_redpanda::RedpandaEventBus;
use todoflow_web::{app_router, AppState, Config, TodoService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    info!(port = config.port, "Starting todoflow web service");
    info!(database_url = %config.database_url, "Using Postgres store");
    info!(brokers = %config.kafka_brokers, "Using event bus");

    let store: Arc<dyn TodoRepository> =
        Arc::new(PostgresTodoStore::connect_lazy(&config.database_url)?);

    // Best-effort warmup. A down database is not fatal: the store retries
    // its connection on every call and the readiness probe reports the gap.
    if let Err(e) = store.ensure_ready().await {
        warn!(error = %e, "Store not ready at startup; will retry per call");
    }

    let bus: Arc<dyn EventBus> = Arc::new(RedpandaEventBus::new(&config.kafka_brokers)?);

    let service = Arc::new(TodoService::new(store, bus));
    let app = app_router(AppState::new(service));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
