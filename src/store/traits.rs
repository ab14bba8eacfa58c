//! `TodoStore` trait — the ownership-scoped repository interface.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::todos::model::Todo;

/// Backend-agnostic todo repository.
///
/// Every operation takes the requesting identity and applies it as an
/// explicit ownership predicate. Absent and not-owned collapse into the
/// same `None`/`false` outcome so callers cannot probe for other users'
/// records. Rows are never physically removed; `delete` flips the
/// soft-delete flag.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All non-deleted todos of `user_id`, in insertion order.
    async fn get_all(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError>;

    /// Fetch one todo by id, if it exists and belongs to `user_id`.
    async fn get_by_id(&self, todo_id: Uuid, user_id: Uuid)
    -> Result<Option<Todo>, DatabaseError>;

    /// Insert a new todo for `user_id` and return it. `text` is stored
    /// as given; the empty string is fine.
    async fn create(&self, text: &str, user_id: Uuid) -> Result<Todo, DatabaseError>;

    /// Non-deleted, not-yet-completed todos of `user_id`.
    async fn get_pending(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError>;

    /// Non-deleted, completed todos of `user_id`.
    async fn get_completed(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError>;

    /// Set `completed = true` and return the updated row, or `None` when
    /// the id is absent or owned by someone else. Idempotent.
    async fn mark_complete(
        &self,
        todo_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, DatabaseError>;

    /// Soft-delete. `false` when the id is absent or owned by someone
    /// else. Idempotent.
    async fn delete(&self, todo_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;
}
