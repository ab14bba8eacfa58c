//! Persistence layer — libsql-backed storage for todos and users.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::TodoStore;
