//! API handlers

use axum::{
    extract::{FromRequest, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::types::{NewTodo, Todo, TodoPatch};

/// JSON body extractor whose rejections answer `400 {"message": ...}`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Health check with store status
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend_name().to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

/// List every todo
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.store.list().await?;
    Ok(Json(todos))
}

/// Create a todo
pub async fn create_todo(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let new = NewTodo::new(payload.task, payload.completed)?;
    let todo = state.store.create(new).await?;

    tracing::debug!(id = %todo.id, "Todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub task: Option<String>,
    pub completed: Option<String>,
}

/// Fetch one todo
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::todo_not_found)
}

/// Partially update a todo
///
/// Only `task` and `completed` can change. The create-time `task` check is
/// not repeated here.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    state
        .store
        .update(&id, patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::todo_not_found)
}

/// Delete a todo
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete(&id).await? {
        tracing::debug!(%id, "Todo deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::todo_not_found())
    }
}
