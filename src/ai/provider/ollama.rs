//! Ollama Local LLM Provider
//!
//! Chat transport for locally-running Ollama models. No credentials needed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionProvider, CompletionRequest, ResponseFormat};
use crate::config::LlmConfig;
use crate::types::{ContentError, ErrorCategory, ErrorClassifier, Result, preview};

const DEFAULT_API_BASE: &str = "http://localhost:11434";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let api_base = Self::validate_endpoint(&api_base)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.saturating_mul(2)))
            .build()
            .map_err(|e| ContentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { api_base, client })
    }

    /// Validate endpoint URL (http/https only, warn when not local)
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            ContentError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContentError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        Ok(endpoint.trim_end_matches('/').to_string())
    }

    fn build_body(request: &CompletionRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request.model_id.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: request.system_instructions.clone(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: request.user_instructions.clone(),
                },
            ],
            stream: false,
            format: (request.response_format == ResponseFormat::Json).then(|| "json".to_string()),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.api_base);
        debug!(model = %request.model_id, "Sending request to Ollama");

        let response = self
            .client
            .post(&url)
            .timeout(request.timeout)
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| {
                ContentError::Llm(ErrorClassifier::classify(
                    &format!("Ollama request failed: {}", e),
                    "ollama",
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ContentError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Ollama API error ({}): {}", status, preview(&text, 300)),
                "ollama",
            )));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|e| {
            ContentError::llm_with_category(
                ErrorCategory::ParseError,
                format!("Failed to decode Ollama response: {}", e),
            )
        })?;

        let content = body.message.content.trim().to_string();
        if content.is_empty() {
            return Err(ContentError::llm_with_category(
                ErrorCategory::ParseError,
                "empty completion from Ollama",
            ));
        }
        Ok(content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}
