//! HTTP-level tests for the todo API, running the real router against the
//! in-memory store and bus doubles.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use todoflow_testing::{InMemoryEventBus, InMemoryTodoStore};
use todoflow_web::{app_router, AppState, TodoService};

fn server() -> (TestServer, InMemoryTodoStore, InMemoryEventBus) {
    let store = InMemoryTodoStore::new();
    let bus = InMemoryEventBus::new();
    let service = Arc::new(TodoService::new(
        Arc::new(store.clone()),
        Arc::new(bus.clone()),
    ));
    let server = TestServer::new(app_router(AppState::new(service))).unwrap();
    (server, store, bus)
}

#[tokio::test]
async fn create_list_and_mark_done() {
    let (server, _store, bus) = server();

    let response = server.post("/todos").json(&json!({"todo": "Buy milk"})).await;
    response.assert_status(http::StatusCode::CREATED);
    response.assert_json(&json!({"id": 1}));

    let response = server.get("/todos").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "todos": [{"id": 1, "name": "Buy milk", "done": false}]
    }));

    let response = server.put("/todos/1").await;
    response.assert_status_ok();
    response.assert_json(&json!({"done": true}));

    let response = server.get("/todos").await;
    response.assert_json(&json!({
        "todos": [{"id": 1, "name": "Buy milk", "done": true}]
    }));

    let operations: Vec<&str> = bus
        .published()
        .iter()
        .map(|(_, e)| e.operation.as_str())
        .collect();
    assert_eq!(operations, vec!["created", "updated"]);
}

#[tokio::test]
async fn invalid_names_are_rejected_with_400() {
    let (server, store, bus) = server();

    let response = server.post("/todos").json(&json!({"todo": ""})).await;
    response.assert_status(http::StatusCode::BAD_REQUEST);

    let long = "x".repeat(141);
    let response = server.post("/todos").json(&json!({ "todo": long })).await;
    response.assert_status(http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");

    assert!(store.snapshot().is_empty());
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn missing_todo_field_is_400_not_422() {
    let (server, store, bus) = server();

    // An empty JSON object carries no todo text at all; it must get the
    // same 400 as an empty string, not an extractor-level 422.
    let response = server.post("/todos").json(&json!({})).await;
    response.assert_status(http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");

    assert!(store.snapshot().is_empty());
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_400() {
    let (server, store, _bus) = server();

    // Wrong field type.
    let response = server.post("/todos").json(&json!({"todo": 5})).await;
    response.assert_status(http::StatusCode::BAD_REQUEST);

    // Wrong content type entirely.
    let response = server
        .post("/todos")
        .content_type("text/plain")
        .bytes("Buy milk".into())
        .await;
    response.assert_status(http::StatusCode::BAD_REQUEST);

    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn form_submissions_are_accepted() {
    let (server, _store, bus) = server();

    let response = server
        .post("/todos")
        .form(&[("todo", "From the form")])
        .await;
    response.assert_status(http::StatusCode::CREATED);
    response.assert_json(&json!({"id": 1}));
    assert_eq!(bus.published().len(), 1);

    // A form without the field is still a 400.
    let response = server.post("/todos").form(&[("other", "x")]).await;
    response.assert_status(http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_id_is_404_without_publish() {
    let (server, _store, bus) = server();

    let response = server.put("/todos/99").await;
    response.assert_status(http::StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn unavailable_store_is_503() {
    let (server, store, _bus) = server();
    store.set_available(false);

    let response = server.post("/todos").json(&json!({"todo": "Buy milk"})).await;
    response.assert_status(http::StatusCode::SERVICE_UNAVAILABLE);

    let response = server.get("/healthz").await;
    response.assert_status(http::StatusCode::SERVICE_UNAVAILABLE);

    // Self-healing: once the store is back, the same probes succeed.
    store.set_available(true);
    let response = server.get("/healthz").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn liveness_never_checks_dependencies() {
    let (server, store, _bus) = server();
    store.set_available(false);

    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("ok");
}
