//! HTTP endpoints for the to-do list.
//!
//! Thin 1:1 mapping onto `TodoStore`; responses are the bare record or
//! list with no envelope. Id-based mutations answer 404 whenever the
//! store reports absent-or-not-owned, including ids that do not parse as
//! UUIDs — an unparseable id cannot name an owned row either.

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::server::AppState;
use crate::todos::model::Todo;

/// `POST /add` body.
#[derive(Debug, Deserialize)]
struct AddTodoBody {
    text: String,
}

/// `PUT /complete` and `DELETE /delete` body.
#[derive(Debug, Deserialize)]
struct TodoIdBody {
    todo_id: String,
}

impl TodoIdBody {
    /// Parse the id, collapsing malformed ids into not-found.
    fn id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.todo_id).map_err(|_| ApiError::NotFound)
    }
}

async fn get_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.store.get_all(user.id).await?))
}

async fn add_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<AddTodoBody>,
) -> Result<(), ApiError> {
    state.store.create(&body.text, user.id).await?;
    Ok(())
}

async fn get_pending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.store.get_pending(user.id).await?))
}

async fn get_completed(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.store.get_completed(user.id).await?))
}

async fn mark_complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<TodoIdBody>,
) -> Result<(), ApiError> {
    match state.store.mark_complete(body.id()?, user.id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound),
    }
}

async fn delete_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<TodoIdBody>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete(body.id()?, user.id).await? {
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(ApiError::NotFound)
    }
}

/// Build the todo routes.
pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(get_all))
        .route("/add", post(add_todo))
        .route("/pending", get(get_pending))
        .route("/completed", get(get_completed))
        .route("/complete", put(mark_complete))
        .route("/delete", delete(delete_todo))
}
