//! Orchestration of the mutation pipeline.
//!
//! [`TodoService`] owns the two halves of every mutation: the authoritative
//! store write and the best-effort publish. The asymmetry is deliberate and
//! load-bearing:
//!
//! - a store failure aborts the request and is surfaced to the caller;
//! - a publish failure is logged and swallowed, because the mutation has
//!   already committed and "mutation happened, no notification sent" is
//!   preferred over failing an otherwise-successful request.
//!
//! The publish is awaited (send acknowledged or failed) before the caller
//! sees success, so every successful mutation performs exactly one
//! observable publish attempt.

use std::sync::Arc;
use todoflow_core::{
    validate_name, EventBus, MutationEvent, Todo, TodoError, TodoRepository, TODO_TOPIC,
};

/// Orchestrates create / mark-done / list over the store and the bus.
#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl TodoService {
    /// Create a service publishing to the default [`TODO_TOPIC`].
    #[must_use]
    pub fn new(repo: Arc<dyn TodoRepository>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            repo,
            bus,
            topic: TODO_TOPIC.to_string(),
        }
    }

    /// Create a todo.
    ///
    /// Validates the name (no side effects on rejection), commits the row,
    /// then publishes `{id, created}` best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Validation`] for an empty or over-long name and
    /// [`TodoError::StoreUnavailable`] if the insert fails; in the latter
    /// case no publish is attempted.
    pub async fn create(&self, name: &str) -> Result<i64, TodoError> {
        validate_name(name).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected todo create");
        })?;

        let id = self.repo.create(name).await?;
        self.publish_best_effort(MutationEvent::created(id)).await;
        Ok(id)
    }

    /// Mark a todo done.
    ///
    /// Idempotent on already-done rows. On success publishes
    /// `{id, updated}` best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] when the id does not exist (no
    /// publish is attempted) and [`TodoError::StoreUnavailable`] if the
    /// update fails.
    pub async fn mark_done(&self, id: i64) -> Result<(), TodoError> {
        if !self.repo.mark_done(id).await? {
            return Err(TodoError::NotFound { id });
        }

        self.publish_best_effort(MutationEvent::updated(id)).await;
        Ok(())
    }

    /// All todos, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] if the store is unreachable.
    pub async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        self.repo.list().await
    }

    /// Readiness: the store connection can be established and the schema
    /// exists. Retried by callers on every probe.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] while the store is
    /// unreachable.
    pub async fn health(&self) -> Result<(), TodoError> {
        self.repo.ensure_ready().await
    }

    /// Publish with swallow-and-log failure semantics.
    ///
    /// The store mutation has already committed when this runs, so a
    /// failure here must not surface to the request caller.
    async fn publish_best_effort(&self, event: MutationEvent) {
        if let Err(e) = self.bus.publish(&self.topic, &event).await {
            tracing::error!(
                todo_id = event.id,
                operation = event.operation.as_str(),
                error = %e,
                "Publish failed after committed mutation; notification lost"
            );
            metrics::counter!("todo_service.publish_dropped").increment(1);
        }
    }
}
