//! Todo CRUD handlers.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{Form, FromRequest, Path, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use todoflow_core::Todo;

/// Request body for creating a todo.
///
/// Accepted as JSON (`{"todo": "<text>"}`) or an
/// `application/x-www-form-urlencoded` form with a `todo` field, the two
/// shapes the presentation layer submits. A missing field deserializes to
/// the empty string so it flows through name validation and comes back as
/// a 400, not an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    /// The todo text.
    #[serde(default)]
    pub todo: String,
}

#[async_trait]
impl<S> FromRequest<S> for CreateTodoRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        // Malformed bodies of either shape are the client's fault: map
        // every extractor rejection to the same 400 the length check uses.
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(request) = Form::<Self>::from_request(req, state)
                .await
                .map_err(|_| AppError::bad_request("missing todo"))?;
            Ok(request)
        } else {
            let Json(request) = Json::<Self>::from_request(req, state)
                .await
                .map_err(|_| AppError::bad_request("missing todo"))?;
            Ok(request)
        }
    }
}

/// Response body for a created todo.
#[derive(Debug, Serialize)]
pub struct CreateTodoResponse {
    /// Store-assigned id of the new todo.
    pub id: i64,
}

/// Response body for the todo listing.
#[derive(Debug, Serialize)]
pub struct ListTodosResponse {
    /// All todos, ordered by id ascending.
    pub todos: Vec<Todo>,
}

/// Response body for a mark-done call.
#[derive(Debug, Serialize)]
pub struct MarkDoneResponse {
    /// Always `true` on success; absence of the row is a 404 instead.
    pub done: bool,
}

/// `GET /todos` — the full current set.
///
/// # Errors
///
/// Responds 503 while the store is unreachable.
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<ListTodosResponse>, AppError> {
    let todos = state.service.list().await?;
    Ok(Json(ListTodosResponse { todos }))
}

/// `POST /todos` — create a todo.
///
/// Responds 201 with the new id.
///
/// # Errors
///
/// Responds 400 on a missing or malformed body as well as validation
/// failure, 503 while the store is unreachable.
pub async fn create_todo(
    State(state): State<AppState>,
    request: CreateTodoRequest,
) -> Result<(StatusCode, Json<CreateTodoResponse>), AppError> {
    let id = state.service.create(&request.todo).await?;
    Ok((StatusCode::CREATED, Json(CreateTodoResponse { id })))
}

/// `PUT /todos/{id}` — mark a todo done.
///
/// Idempotent on already-done rows.
///
/// # Errors
///
/// Responds 404 for an unknown id, 503 while the store is unreachable.
pub async fn mark_done(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MarkDoneResponse>, AppError> {
    state.service.mark_done(id).await?;
    Ok(Json(MarkDoneResponse { done: true }))
}
