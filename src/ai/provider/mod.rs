//! Chat-Completion Provider Abstraction
//!
//! Defines the `CompletionProvider` trait: one request in, raw completion text
//! out. Providers do no retrying and no JSON handling; that lives in
//! [`StructuredCompletionClient`](crate::ai::StructuredCompletionClient).

#[cfg(test)]
pub(crate) mod mock;
mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::types::{ContentError, Result};

// =============================================================================
// Completion Request
// =============================================================================

/// Expected response body format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text
    #[default]
    Text,
    /// Ask the service for a JSON object (not guaranteed)
    Json,
}

/// One immutable chat-completion request.
///
/// A fresh request is built for every attempt, including retries and
/// fallback-model attempts; see [`CompletionRequest::for_model`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instructions: String,
    pub user_instructions: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub timeout: Duration,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    pub fn new(
        system_instructions: impl Into<String>,
        user_instructions: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            user_instructions: user_instructions.into(),
            model_id: model_id.into(),
            temperature: crate::constants::network::DEFAULT_TEMPERATURE,
            max_output_tokens: Some(crate::constants::network::DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(crate::constants::network::DEFAULT_TIMEOUT_SECS),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    /// A new request identical to this one but addressed to `model_id`
    pub fn for_model(&self, model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            ..self.clone()
        }
    }
}

/// Shared provider type for concurrent package assembly.
pub type SharedProvider = Arc<dyn CompletionProvider + Send + Sync>;

// =============================================================================
// Provider Trait
// =============================================================================

/// Remote chat-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the completion text.
    ///
    /// Implementations must not retry; an empty body is an error.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => Err(ContentError::Config(format!(
            "Unknown provider: {}. Supported: openai, ollama",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_model_builds_new_request() {
        let base = CompletionRequest::new("sys", "user", "gpt-4o-mini")
            .with_temperature(0.2)
            .with_response_format(ResponseFormat::Json);
        let fallback = base.for_model("gpt-4o");

        assert_eq!(base.model_id, "gpt-4o-mini");
        assert_eq!(fallback.model_id, "gpt-4o");
        assert_eq!(fallback.temperature, 0.2);
        assert_eq!(fallback.response_format, ResponseFormat::Json);
        assert_eq!(fallback.system_instructions, base.system_instructions);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = LlmConfig {
            provider: "nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ContentError::Config(_))
        ));
    }
}
