//! Application state for Axum handlers.

use crate::service::TodoService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The orchestration service handlers dispatch into.
    pub service: Arc<TodoService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(service: Arc<TodoService>) -> Self {
        Self { service }
    }
}
