//! `PostgreSQL` todo store for the todoflow mutation pipeline.
//!
//! Implements the [`TodoRepository`] trait from `todoflow-core` on top of a
//! lazily-connecting sqlx pool:
//!
//! - **Connect-on-demand**: the pool is created without touching the
//!   network; every call acquires a connection as needed, so the store
//!   self-heals by retrying the connection on each call while disconnected.
//! - **Idempotent schema**: [`TodoRepository::ensure_ready`] creates the
//!   `todos` table if absent and doubles as the readiness probe.
//! - **Immediate commits**: every write is a single auto-committed
//!   statement; there is no batching.
//!
//! # Example
//!
//! ```no_run
//! use todoflow_postgres::PostgresTodoStore;
//! use todoflow_core::TodoRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresTodoStore::connect_lazy("postgres://localhost/todos")?;
//! store.ensure_ready().await?;
//! let id = store.create("Buy milk").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use todoflow_core::{Todo, TodoError, TodoRepository};

/// `PostgreSQL`-backed implementation of [`TodoRepository`].
///
/// Holds a lazily-connecting [`PgPool`]; cloning is cheap and all clones
/// share the same pool.
#[derive(Debug, Clone)]
pub struct PostgresTodoStore {
    pool: PgPool,
}

impl PostgresTodoStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a store whose pool connects on first use.
    ///
    /// No connection is attempted here; an unreachable database surfaces as
    /// [`TodoError::StoreUnavailable`] on the first call instead, and every
    /// subsequent call retries.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::StoreUnavailable`] only if the URL itself is
    /// malformed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, TodoError> {
        // Short acquire timeout keeps a dead database from stalling the
        // request path; callers treat the failure as retryable.
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy(database_url)
            .map_err(store_unavailable)?;

        tracing::info!("Postgres todo store configured (lazy connect)");

        Ok(Self { pool })
    }

    fn row_to_todo(row: &PgRow) -> Todo {
        Todo {
            id: row.get("id"),
            name: row.get("name"),
            done: row.get("done"),
        }
    }
}

fn store_unavailable(e: sqlx::Error) -> TodoError {
    TodoError::StoreUnavailable {
        reason: e.to_string(),
    }
}

impl TodoRepository for PostgresTodoStore {
    fn ensure_ready(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(), TodoError>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r"
                CREATE TABLE IF NOT EXISTS todos (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    done BOOLEAN NOT NULL DEFAULT FALSE
                )
                ",
            )
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Todo store not ready");
                store_unavailable(e)
            })?;

            Ok(())
        })
    }

    fn create(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<i64, TodoError>> + Send + '_>> {
        let name = name.to_string();

        Box::pin(async move {
            let (id,): (i64,) = sqlx::query_as(
                r"
                INSERT INTO todos (name, done)
                VALUES ($1, FALSE)
                RETURNING id
                ",
            )
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .map_err(store_unavailable)?;

            tracing::info!(todo_id = id, "Todo created");
            metrics::counter!("todo_store.created").increment(1);

            Ok(id)
        })
    }

    fn mark_done(
        &self,
        id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, TodoError>> + Send + '_>> {
        Box::pin(async move {
            // RETURNING distinguishes "row updated" from "no such row"
            // without a second query. Re-marking a done row is idempotent.
            let row: Option<(bool,)> = sqlx::query_as(
                r"
                UPDATE todos
                SET done = TRUE
                WHERE id = $1
                RETURNING done
                ",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_unavailable)?;

            let found = row.is_some();
            if found {
                tracing::info!(todo_id = id, "Todo marked done");
                metrics::counter!("todo_store.marked_done").increment(1);
            } else {
                tracing::debug!(todo_id = id, "Mark-done on unknown id");
            }

            Ok(found)
        })
    }

    fn list(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Todo>, TodoError>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT id, name, done
                FROM todos
                ORDER BY id ASC
                ",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(store_unavailable)?;

            Ok(rows.iter().map(Self::row_to_todo).collect())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn store_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<PostgresTodoStore>();
        assert_sync::<PostgresTodoStore>();
    }

    #[test]
    fn malformed_url_is_store_unavailable() {
        let err = PostgresTodoStore::connect_lazy("not-a-url").unwrap_err();
        assert!(matches!(err, TodoError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn unreachable_database_surfaces_as_unavailable_not_panic() {
        // connect_lazy succeeds without a network; the failure shows up on
        // the first call and the store stays usable for later retries.
        let store = PostgresTodoStore::connect_lazy(
            "postgres://localhost:1/todoflow_nonexistent",
        )
        .unwrap();

        let err = store.ensure_ready().await.unwrap_err();
        assert!(matches!(err, TodoError::StoreUnavailable { .. }));

        let err = store.create("still disconnected").await.unwrap_err();
        assert!(matches!(err, TodoError::StoreUnavailable { .. }));
    }
}
