//! LLM integration — DeepSeek chat completions behind a provider trait.
//!
//! The `LlmProvider` trait keeps handlers testable with stub providers;
//! `DeepSeekProvider` is the one real backend, speaking the
//! OpenAI-compatible chat-completions protocol over `reqwest`.

mod deepseek;
pub mod provider;

pub use deepseek::DeepSeekProvider;
pub use provider::{ChatRequest, FragmentStream, LlmProvider};

use std::sync::Arc;

use crate::config::AppConfig;

/// Build the provider from configuration.
///
/// Returns `None` when no API key is configured; AI endpoints then answer
/// with a server error before any network activity, since there is no
/// provider to call.
pub fn create_provider(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
    let api_key = config.deepseek_api_key.clone()?;
    tracing::info!(model = %config.model, "Using DeepSeek provider");
    Some(Arc::new(DeepSeekProvider::new(
        config.deepseek_base_url.clone(),
        api_key,
        config.model.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_means_no_provider() {
        let config = AppConfig::default();
        assert!(create_provider(&config).is_none());
    }

    #[test]
    fn key_builds_provider_with_configured_model() {
        let config = AppConfig {
            deepseek_api_key: Some(secrecy::SecretString::from("sk-test")),
            ..AppConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "deepseek-chat");
    }
}
