//! Router assembly and shared application state.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::llm::LlmProvider;
use crate::store::TodoStore;

/// State shared by all handlers.
///
/// Both handles are immutable `Arc`s; the provider is `None` when no API
/// key was configured at startup, and stays that way for the life of the
/// process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { store, llm }
    }

    /// The provider, or the fail-fast credential error. Checked before
    /// any prompt is built so a missing key never reaches the network.
    pub fn llm(&self) -> Result<Arc<dyn LlmProvider>, ApiError> {
        self.llm.clone().ok_or(ApiError::MissingApiKey)
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(crate::todos::routes::todo_routes())
        .merge(crate::ai::routes::ai_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
