//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default DeepSeek API endpoint (OpenAI-compatible).
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
/// Default chat model.
const DEFAULT_MODEL: &str = "deepseek-chat";

/// Server configuration.
///
/// Loaded once before serving begins and immutable thereafter; the
/// credential is never re-read from the environment mid-flight.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Path of the local libsql database file.
    pub db_path: PathBuf,
    /// DeepSeek API key. `None` means AI endpoints answer 500.
    pub deepseek_api_key: Option<SecretString>,
    /// Base URL of the OpenAI-compatible chat API.
    pub deepseek_base_url: String,
    /// Model name sent with every completion request.
    pub model: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// `DEEPSEEK_API_KEY` is optional on purpose: the todo endpoints work
    /// without it, and the AI routes fail fast per request when it is
    /// absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = match std::env::var("TODO_ORACLE_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TODO_ORACLE_PORT".to_string(),
                message: format!("not a valid port: {raw}"),
            })?,
            Err(_) => 8000,
        };

        let db_path = std::env::var("TODO_ORACLE_DB_PATH")
            .unwrap_or_else(|_| "./data/todo-oracle.db".to_string());

        let deepseek_api_key = std::env::var("DEEPSEEK_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let deepseek_base_url = std::env::var("DEEPSEEK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model =
            std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            db_path: PathBuf::from(db_path),
            deepseek_api_key,
            deepseek_base_url,
            model,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            db_path: PathBuf::from("./data/todo-oracle.db"),
            deepseek_api_key: None,
            deepseek_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}
