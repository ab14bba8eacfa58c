//! Backend-agnostic chat-completion provider trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::LlmError;

/// A single chat-completion request: one system prompt, one user turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System instruction (persona or structured prompt).
    pub system: String,
    /// The user turn.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum generated tokens.
    pub max_tokens: u32,
}

/// Stream of incremental text fragments from the provider.
///
/// Each item is one delta, in arrival order. The stream ends when the
/// provider's does; errors abort it with no retry.
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// Chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;

    /// Run a completion to the end and return the first choice's text.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;

    /// Open a streamed completion and yield text fragments as they arrive.
    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream, LlmError>;
}
