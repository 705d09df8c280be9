//! Durable todo store abstraction.

use crate::error::TodoError;
use crate::todo::Todo;
use std::future::Future;
use std::pin::Pin;

/// Trait for durable todo stores.
///
/// The store is the single source of truth for todo rows. All writes commit
/// immediately; reads observe committed state only. Like
/// [`EventBus`](crate::event_bus::EventBus), the trait returns boxed futures
/// so it can be held as `Arc<dyn TodoRepository>`.
pub trait TodoRepository: Send + Sync {
    /// Establish the backing connection and create the schema if absent.
    ///
    /// Idempotent. Failure leaves the store disconnected and is recoverable:
    /// callers (health checks in particular) retry on the next invocation
    /// rather than treating it as fatal.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] while the store is
    /// unreachable.
    fn ensure_ready(&self)
    -> Pin<Box<dyn Future<Output = Result<(), TodoError>> + Send + '_>>;

    /// Insert a todo with `done = false` and return its store-assigned id.
    ///
    /// Name validation happens in the service layer before this call, but
    /// the store must tolerate boundary-length values without failing.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] if the insert cannot reach
    /// the store.
    fn create(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<i64, TodoError>> + Send + '_>>;

    /// Set `done = true` on the row with the given id.
    ///
    /// Returns `true` if a row was found and updated (idempotently re-set
    /// when already done), `false` when the id does not exist. Absence is a
    /// normal negative result, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] if the update cannot reach
    /// the store.
    fn mark_done(
        &self,
        id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, TodoError>> + Send + '_>>;

    /// Fetch the full current set of todos, ordered by id ascending.
    ///
    /// No pagination, no filtering.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] if the query cannot reach
    /// the store.
    fn list(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Todo>, TodoError>> + Send + '_>>;
}
