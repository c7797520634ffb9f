//! OpenAI API Provider
//!
//! Chat Completions transport. Returns the raw message text; JSON handling
//! happens in the validation layer.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CompletionProvider, CompletionRequest, ResponseFormat};
use crate::config::LlmConfig;
use crate::types::{ContentError, ErrorCategory, ErrorClassifier, Result, preview};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    /// Missing credentials are a fatal configuration error, never retried.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ContentError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or llm.api_key in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        // Per-attempt deadlines are enforced by the client; this is a backstop.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.saturating_mul(2)))
            .build()
            .map_err(|e| ContentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            client,
        })
    }

    fn build_body(request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model_id.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_instructions.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_instructions.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            response_format: match request.response_format {
                ResponseFormat::Json => Some(ResponseFormatBody {
                    format_type: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = Self::build_body(request);

        debug!(model = %request.model_id, "Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ContentError::Llm(ErrorClassifier::classify(
                    &format!("OpenAI request failed: {}", e),
                    "openai",
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ContentError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, preview(&text, 300)),
                "openai",
            )));
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            ContentError::llm_with_category(
                ErrorCategory::ParseError,
                format!("Failed to decode OpenAI response: {}", e),
            )
        })?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ContentError::llm_with_category(
                ErrorCategory::ParseError,
                "empty completion from OpenAI",
            ));
        }

        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: key.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_body_carries_both_messages() {
        let request = CompletionRequest::new("be terse", "hello", "gpt-4o-mini")
            .with_response_format(ResponseFormat::Json)
            .with_max_output_tokens(Some(100));
        let body = serde_json::to_value(OpenAiProvider::build_body(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_text_format_omits_response_format() {
        let request = CompletionRequest::new("s", "u", "m").with_max_output_tokens(None);
        let body = serde_json::to_value(OpenAiProvider::build_body(&request)).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_key_from_config_is_redacted() {
        let provider = OpenAiProvider::new(&config_with_key(Some("sk-test"))).unwrap();
        assert!(!format!("{:?}", provider).contains("sk-test"));
    }

    #[test]
    fn test_blank_key_is_config_error() {
        // A whitespace key counts as missing even if the env var is unset.
        let config = config_with_key(Some("   "));
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(matches!(
                OpenAiProvider::new(&config),
                Err(ContentError::Config(_))
            ));
        }
    }
}
