//! # Todoflow testing
//!
//! In-memory doubles for the pipeline's two external systems:
//!
//! - [`InMemoryTodoStore`] — a [`TodoRepository`] over a mutex-held vec
//!   with monotone ids and failure injection for unavailable-store tests.
//! - [`InMemoryEventBus`] — an [`EventBus`] that records every publish and
//!   reproduces consumer-group semantics (each event goes to exactly one
//!   member per group, round-robin), so group-delivery properties can be
//!   tested without a broker.
//!
//! ## Example
//!
//! ```
//! use todoflow_testing::{InMemoryEventBus, InMemoryTodoStore};
//! use todoflow_core::{EventBus, MutationEvent, TodoRepository, TODO_TOPIC};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryTodoStore::new();
//! let id = store.create("Buy milk").await.unwrap();
//! assert_eq!(id, 1);
//!
//! let bus = InMemoryEventBus::new();
//! bus.publish(TODO_TOPIC, &MutationEvent::created(id)).await.unwrap();
//! assert_eq!(bus.published().len(), 1);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)] // Test support code

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use todoflow_core::{
    EventBus, EventBusError, EventStream, MutationEvent, Todo, TodoError, TodoRepository,
};

/// In-memory [`TodoRepository`] double.
///
/// Ids start at 1 and increase monotonically, matching the store contract.
/// [`set_available`](Self::set_available) simulates a lost backing
/// connection: while unavailable every call fails with
/// [`TodoError::StoreUnavailable`] and state is untouched.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    next_id: i64,
    todos: Vec<Todo>,
    unavailable: bool,
}

impl InMemoryTodoStore {
    /// Create an empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability. While `false`, all calls fail with
    /// [`TodoError::StoreUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    /// Snapshot of the current rows, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Todo> {
        self.lock().todos.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_available(inner: &StoreInner) -> Result<(), TodoError> {
        if inner.unavailable {
            return Err(TodoError::StoreUnavailable {
                reason: "in-memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl TodoRepository for InMemoryTodoStore {
    fn ensure_ready(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<(), TodoError>> + Send + '_>> {
        Box::pin(async move { Self::check_available(&self.lock()) })
    }

    fn create(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<i64, TodoError>> + Send + '_>> {
        let name = name.to_string();
        Box::pin(async move {
            let mut inner = self.lock();
            Self::check_available(&inner)?;

            inner.next_id += 1;
            let id = inner.next_id;
            inner.todos.push(Todo {
                id,
                name,
                done: false,
            });
            Ok(id)
        })
    }

    fn mark_done(
        &self,
        id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<bool, TodoError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.lock();
            Self::check_available(&inner)?;

            match inner.todos.iter_mut().find(|t| t.id == id) {
                Some(todo) => {
                    todo.done = true;
                    Ok(true)
                },
                None => Ok(false),
            }
        })
    }

    fn list(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Todo>, TodoError>> + Send + '_>> {
        Box::pin(async move {
            let inner = self.lock();
            Self::check_available(&inner)?;
            Ok(inner.todos.clone())
        })
    }
}

type GroupKey = (String, String);
type EventSender = tokio::sync::mpsc::UnboundedSender<Result<MutationEvent, EventBusError>>;

#[derive(Default)]
struct GroupMembers {
    senders: Vec<EventSender>,
    next: usize,
}

#[derive(Default)]
struct BusInner {
    published: Vec<(String, MutationEvent)>,
    groups: HashMap<GroupKey, GroupMembers>,
    fail_publishes: bool,
}

/// In-memory [`EventBus`] double with consumer-group delivery.
///
/// Every successful publish is recorded for assertions and delivered to
/// exactly one member of each consumer group subscribed to the topic,
/// round-robin across members — the same observable contract a
/// Kafka-compatible broker gives N broadcaster replicas sharing a group.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail with
    /// [`EventBusError::PublishFailed`]. Failed publishes are not recorded
    /// and nothing is delivered.
    pub fn fail_publishes(&self, fail: bool) {
        self.lock().fail_publishes = fail;
    }

    /// All events successfully published so far, with their topics, in
    /// call order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, MutationEvent)> {
        self.lock().published.clone()
    }

    /// Deliver a raw payload to the topic's groups, decoding it the way a
    /// real consumer would.
    ///
    /// Malformed bytes arrive at subscribers as in-stream
    /// [`EventBusError::DecodeFailed`] items, which is how broadcaster
    /// drop-and-continue behavior is exercised.
    pub fn publish_raw(&self, topic: &str, payload: &[u8]) {
        let result = MutationEvent::from_payload(payload);
        let mut inner = self.lock();
        Self::deliver(&mut inner, topic, &result);
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn deliver(inner: &mut BusInner, topic: &str, result: &Result<MutationEvent, EventBusError>) {
        for ((t, _group), members) in &mut inner.groups {
            if t.as_str() != topic {
                continue;
            }
            // One member per group, round-robin. A dropped receiver means
            // that member left the group: it is pruned and the event goes
            // to the next surviving member, the way a broker rebalances.
            while !members.senders.is_empty() {
                let idx = members.next % members.senders.len();
                if members.senders[idx].send(result.clone()).is_ok() {
                    members.next = idx + 1;
                    break;
                }
                members.senders.remove(idx);
            }
        }
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &MutationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = *event;

        Box::pin(async move {
            let mut inner = self.lock();
            if inner.fail_publishes {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "in-memory bus configured to fail".to_string(),
                });
            }

            inner.published.push((topic.clone(), event));
            Self::deliver(&mut inner, &topic, &Ok(event));
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topic: &str,
        group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let key = (topic.to_string(), group.to_string());

        Box::pin(async move {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            self.lock().groups.entry(key).or_default().senders.push(tx);

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use todoflow_core::TODO_TOPIC;

    #[tokio::test]
    async fn store_assigns_monotone_ids() {
        let store = InMemoryTodoStore::new();
        assert_eq!(store.create("a").await.unwrap(), 1);
        assert_eq!(store.create("b").await.unwrap(), 2);

        let todos = store.list().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert!(todos.iter().all(|t| !t.done));
    }

    #[tokio::test]
    async fn unavailable_store_rejects_everything() {
        let store = InMemoryTodoStore::new();
        store.set_available(false);

        assert!(store.ensure_ready().await.is_err());
        assert!(store.create("a").await.is_err());
        assert!(store.list().await.is_err());

        store.set_available(true);
        assert!(store.ensure_ready().await.is_ok());
    }

    #[tokio::test]
    async fn mark_done_reports_absence() {
        let store = InMemoryTodoStore::new();
        assert!(!store.mark_done(99).await.unwrap());

        let id = store.create("a").await.unwrap();
        assert!(store.mark_done(id).await.unwrap());
        // Idempotent second call.
        assert!(store.mark_done(id).await.unwrap());
        assert!(store.snapshot()[0].done);
    }

    #[tokio::test]
    async fn each_group_member_gets_events_exactly_once() {
        let bus = InMemoryEventBus::new();
        let mut a = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();
        let mut b = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();

        bus.publish(TODO_TOPIC, &MutationEvent::created(1)).await.unwrap();
        bus.publish(TODO_TOPIC, &MutationEvent::created(2)).await.unwrap();

        // Round-robin: one event per member, none duplicated.
        let first = a.next().await.unwrap().unwrap();
        let second = b.next().await.unwrap().unwrap();
        assert_ne!(first.id, second.id);

        // Neither member has a second delivery pending.
        use futures::FutureExt;
        assert!(a.next().now_or_never().is_none());
        assert!(b.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn events_reroute_to_surviving_group_members() {
        let bus = InMemoryEventBus::new();
        let mut survivor = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();
        let departed = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();
        drop(departed);

        // With one member gone, every event must still reach the group:
        // deliveries aimed at the departed member fall through to the
        // survivor instead of vanishing.
        for id in 1..=4 {
            bus.publish(TODO_TOPIC, &MutationEvent::created(id)).await.unwrap();
        }

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(survivor.next().await.unwrap().unwrap().id);
        }
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn distinct_groups_each_see_every_event() {
        let bus = InMemoryEventBus::new();
        let mut notifiers = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();
        let mut auditors = bus.subscribe(TODO_TOPIC, "auditors").await.unwrap();

        bus.publish(TODO_TOPIC, &MutationEvent::updated(7)).await.unwrap();

        assert_eq!(notifiers.next().await.unwrap().unwrap().id, 7);
        assert_eq!(auditors.next().await.unwrap().unwrap().id, 7);
    }

    #[tokio::test]
    async fn raw_garbage_arrives_as_decode_error() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.subscribe(TODO_TOPIC, "todo-notifiers").await.unwrap();

        bus.publish_raw(TODO_TOPIC, b"garbage");
        bus.publish_raw(TODO_TOPIC, br#"{"id": 3, "operation": "created"}"#);

        assert!(matches!(
            stream.next().await.unwrap(),
            Err(EventBusError::DecodeFailed(_))
        ));
        assert_eq!(stream.next().await.unwrap().unwrap().id, 3);
    }

    #[tokio::test]
    async fn failed_publishes_are_not_recorded() {
        let bus = InMemoryEventBus::new();
        bus.fail_publishes(true);

        let err = bus
            .publish(TODO_TOPIC, &MutationEvent::created(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EventBusError::PublishFailed { .. }));
        assert!(bus.published().is_empty());
    }
}
