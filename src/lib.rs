//! todo-oracle — a small web backend pairing a per-user to-do list with a
//! DeepSeek chat proxy (rebuttal chat plus I-Ching divination readings).

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod store;
pub mod todos;
