//! Row types for the todo schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single to-do item.
///
/// Only two mutations exist: `completed` flips to true (one-directional,
/// there is no un-complete) and `is_deleted` flips to true (terminal soft
/// delete). `user_id` is immutable after creation and every read is
/// scoped by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Unique ID, generated at creation.
    pub id: Uuid,
    /// Content string. Empty text is accepted.
    pub text: String,
    /// Whether the item is done.
    pub completed: bool,
    /// Soft-delete flag. Deleted rows stay in storage forever.
    pub is_deleted: bool,
    /// Owner of this todo.
    pub user_id: Uuid,
    /// When the todo was created.
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Create a fresh item for `user_id`.
    pub fn new(text: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            completed: false,
            is_deleted: false,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// A user row.
///
/// Identity only; everything else about a user belongs to the external
/// auth layer, which writes these rows through `upsert_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            phone: None,
            created_at: Utc::now(),
        }
    }
}

/// An SMS verification code record.
///
/// Declared for the external auth flow; this crate carries the table but
/// no logic around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(dead_code)]
pub struct SmsCodeRecord {
    pub id: Uuid,
    pub phone: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}
