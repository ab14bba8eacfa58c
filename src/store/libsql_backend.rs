//! libsql backend — async `TodoStore` implementation.
//!
//! Supports local file and in-memory databases. Every statement is its
//! own unit of work (libsql auto-commit); there is no batching.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, Row, params};
use tracing::info;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::TodoStore;
use crate::todos::model::{Todo, User};

const TODO_COLUMNS: &str = "id, text, completed, is_deleted, user_id, created_at";

/// libsql database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Users (written by the external auth layer) ──────────────────

    /// Insert or refresh a user row.
    pub async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, phone, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET phone = excluded.phone",
                params![
                    user.id.to_string(),
                    user.phone.clone(),
                    user.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_user: {e}")))?;
        Ok(())
    }

    /// Fetch a user row by id.
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, phone, created_at FROM users WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => {
                let id_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_user: {e}")))?;
                Ok(Some(User {
                    id: parse_uuid(&id_str)?,
                    phone: row.get::<String>(1).ok(),
                    created_at: parse_datetime(&row.get::<String>(2).unwrap_or_default()),
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user: {e}"))),
        }
    }

    /// Fetch a todo by id alone, ignoring ownership. Internal; callers go
    /// through `get_by_id` which applies the ownership predicate.
    async fn fetch_any(&self, todo_id: Uuid) -> Result<Option<Todo>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![todo_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_any: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_todo(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("fetch_any: {e}"))),
        }
    }

    /// Run a filtered list query for one user.
    async fn list_where(
        &self,
        extra_predicate: &str,
        user_id: Uuid,
        label: &str,
    ) -> Result<Vec<Todo>, DatabaseError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos \
             WHERE is_deleted = 0 AND user_id = ?1{extra_predicate} \
             ORDER BY created_at ASC"
        );
        let mut rows = self
            .conn()
            .query(&sql, params![user_id.to_string()])
            .await
            .map_err(|e| DatabaseError::Query(format!("{label}: {e}")))?;

        let mut todos = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            todos.push(row_to_todo(&row)?);
        }
        Ok(todos)
    }
}

#[async_trait]
impl TodoStore for LibSqlBackend {
    async fn get_all(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError> {
        self.list_where("", user_id, "get_all").await
    }

    async fn get_by_id(
        &self,
        todo_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, DatabaseError> {
        // Ownership predicate applied in code: a row owned by someone
        // else is indistinguishable from no row at all.
        match self.fetch_any(todo_id).await? {
            Some(todo) if todo.user_id == user_id => Ok(Some(todo)),
            _ => Ok(None),
        }
    }

    async fn create(&self, text: &str, user_id: Uuid) -> Result<Todo, DatabaseError> {
        let todo = Todo::new(text, user_id);
        self.conn()
            .execute(
                &format!("INSERT INTO todos ({TODO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    todo.id.to_string(),
                    todo.text.clone(),
                    todo.completed as i64,
                    todo.is_deleted as i64,
                    todo.user_id.to_string(),
                    todo.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create: {e}")))?;
        Ok(todo)
    }

    async fn get_pending(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError> {
        self.list_where(" AND completed = 0", user_id, "get_pending")
            .await
    }

    async fn get_completed(&self, user_id: Uuid) -> Result<Vec<Todo>, DatabaseError> {
        self.list_where(" AND completed = 1", user_id, "get_completed")
            .await
    }

    async fn mark_complete(
        &self,
        todo_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, DatabaseError> {
        let Some(mut todo) = self.get_by_id(todo_id, user_id).await? else {
            return Ok(None);
        };
        self.conn()
            .execute(
                "UPDATE todos SET completed = 1 WHERE id = ?1",
                params![todo_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("mark_complete: {e}")))?;
        todo.completed = true;
        Ok(Some(todo))
    }

    async fn delete(&self, todo_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        if self.get_by_id(todo_id, user_id).await?.is_none() {
            return Ok(false);
        }
        self.conn()
            .execute(
                "UPDATE todos SET is_deleted = 1 WHERE id = ?1",
                params![todo_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete: {e}")))?;
        Ok(true)
    }
}

// ── Row mapping ─────────────────────────────────────────────────────

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("bad uuid {s}: {e}")))
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a libsql row to a Todo. Column order matches TODO_COLUMNS.
fn row_to_todo(row: &Row) -> Result<Todo, DatabaseError> {
    let get_str = |idx: i32| -> Result<String, DatabaseError> {
        row.get(idx)
            .map_err(|e| DatabaseError::Query(format!("column {idx}: {e}")))
    };

    Ok(Todo {
        id: parse_uuid(&get_str(0)?)?,
        text: get_str(1)?,
        completed: row.get::<i64>(2).unwrap_or(0) != 0,
        is_deleted: row.get::<i64>(3).unwrap_or(0) != 0,
        user_id: parse_uuid(&get_str(4)?)?,
        created_at: parse_datetime(&get_str(5)?),
    })
}
