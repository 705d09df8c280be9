//! Health check endpoints.
//!
//! Used by load balancers and supervisors to verify service health.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode};

/// Liveness: the process is running. Checks no dependencies.
///
/// ```text
/// GET /
/// ```
#[allow(clippy::unused_async)]
pub async fn liveness() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness: the store connection can be established.
///
/// Re-probes the store on every call, so a disconnected store heals itself
/// on a later probe without restarting the process.
///
/// ```text
/// GET /healthz
/// ```
///
/// Returns 200 when ready, 503 while the store is unreachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.service.health().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        },
    }
}
