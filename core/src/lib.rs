//! Core traits and types for the todoflow mutation pipeline.
//!
//! This crate defines the domain model (todos and the mutation events they
//! emit), the error taxonomy, and the two trait seams the pipeline is built
//! around:
//!
//! - [`TodoRepository`](repository::TodoRepository) — the durable todo store
//!   (implemented over `PostgreSQL` in `todoflow-postgres`, in memory in
//!   `todoflow-testing`).
//! - [`EventBus`](event_bus::EventBus) — publish/subscribe with
//!   consumer-group semantics (implemented over Kafka-compatible brokers in
//!   `todoflow-redpanda`, in memory in `todoflow-testing`).
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────┐
//! │   Request   │
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────────┐
//! │  1. Postgres    │
//! │   (persist)     │◄─── Source of truth
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  2. Event bus   │
//! │   (publish)     │◄─── Best-effort signal
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Broadcaster    │◄─── One group member per event
//! └─────────────────┘
//! ```
//!
//! The store mutation is authoritative; the publish is a best-effort
//! secondary signal whose failure is logged, never surfaced to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod event_bus;
pub mod repository;
pub mod todo;

pub use error::TodoError;
pub use event::{MutationEvent, Operation, TODO_TOPIC};
pub use event_bus::{EventBus, EventBusError, EventStream};
pub use repository::TodoRepository;
pub use todo::{Todo, validate_name, MAX_NAME_LEN};
