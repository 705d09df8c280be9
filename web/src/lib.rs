//! HTTP surface and orchestration for the todoflow mutation pipeline.
//!
//! This crate glues the pipeline together for request traffic:
//!
//! 1. **HTTP request** arrives at an Axum handler.
//! 2. The handler dispatches into [`TodoService`](service::TodoService).
//! 3. The service validates input, commits the mutation through
//!    [`TodoRepository`](todoflow_core::TodoRepository), then publishes the
//!    matching [`MutationEvent`](todoflow_core::MutationEvent) best-effort.
//! 4. The handler maps the result to an HTTP response; publish failures
//!    never reach the client because the mutation already committed.
//!
//! # API
//!
//! - `GET  /todos` → `{"todos": [{id, name, done}, ...]}`
//! - `POST /todos` with `{"todo": "<text>"}` → `201 {"id": n}`
//! - `PUT  /todos/{id}` → `{"done": true}`
//! - `GET  /healthz` → readiness (200 / 503)
//! - `GET  /` → liveness

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod service;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use router::app_router;
pub use service::TodoService;
pub use state::AppState;
