//! Router composition for the todo API.

use crate::handlers::{health, todos};
use crate::state::AppState;
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// # Routes
///
/// - `GET  /todos` — list all todos
/// - `POST /todos` — create a todo
/// - `PUT  /todos/{id}` — mark a todo done
/// - `GET  /healthz` — readiness (probes the store)
/// - `GET  /` — liveness
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/:id", put(todos::mark_done))
        .route("/healthz", get(health::readiness))
        .route("/", get(health::liveness))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
