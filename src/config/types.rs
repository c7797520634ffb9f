//! Configuration Types
//!
//! All configuration structures with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{budget, content, language, network, retry};
use crate::types::{ContentError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Retry and backoff settings
    pub retry: RetryConfig,

    /// Content package settings
    pub content: ContentConfig,

    /// Language consistency settings
    pub language: LanguageConfig,

    /// Soft usage budget for optional polishing
    pub budget: BudgetConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            content: ContentConfig::default(),
            language: LanguageConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ContentError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ContentError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ContentError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ContentError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        self.language
            .target
            .parse::<crate::content::TargetLanguage>()
            .map_err(|e| ContentError::Config(format!("language.target: {}", e)))?;

        let threshold = self.language.ascii_ratio_threshold;
        if threshold <= 0.0 || threshold >= 1.0 {
            return Err(ContentError::Config(format!(
                "language.ascii_ratio_threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }

        let counts = [
            ("content.title_count", self.content.title_count),
            ("content.chapter_count", self.content.chapter_count),
            ("content.hashtag_count", self.content.hashtag_count),
            ("content.image_count", self.content.image_count),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ContentError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.budget.humanize_max_secs < 0.0 {
            return Err(ContentError::Config(
                "budget.humanize_max_secs must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Primary model
    pub model: String,

    /// Model tried after the primary exhausts its attempts
    pub fallback_model: Option<String>,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature for primary generation
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// API key; never serialized, falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            fallback_model: Some("gpt-4o".to_string()),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: network::DEFAULT_TEMPERATURE,
            max_tokens: network::DEFAULT_MAX_TOKENS,
            api_base: None,
            api_key: None,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per model
    pub max_attempts: u32,

    /// Delay before each retry, in milliseconds
    pub backoff_ms: Vec<u64>,

    /// Add random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            backoff_ms: retry::BACKOFF_SCHEDULE_MS.to_vec(),
            jitter: true,
        }
    }
}

// =============================================================================
// Content Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Call-to-action line for promotional content
    pub cta: String,

    /// Narrator persona used in voice rules
    pub persona: String,

    /// Regional context for the humanizing pass
    pub region: String,

    /// Topic keywords that make auto mode promotional
    pub promo_keywords: Vec<String>,

    pub title_count: usize,
    pub chapter_count: usize,
    pub hashtag_count: usize,
    pub image_count: usize,

    /// Minimum article body length in characters
    pub minimum_body_length: usize,

    /// Run the optional humanizing pass
    pub humanize: bool,

    /// Deadline for one whole package assembly; 0 disables it
    pub overall_deadline_secs: u64,

    /// Deadline for a single expansion follow-up
    pub expansion_deadline_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            cta: content::DEFAULT_CTA.to_string(),
            persona: content::DEFAULT_PERSONA.to_string(),
            region: content::DEFAULT_REGION.to_string(),
            promo_keywords: content::PROMO_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            title_count: content::TITLE_COUNT,
            chapter_count: content::CHAPTER_COUNT,
            hashtag_count: content::HASHTAG_COUNT,
            image_count: content::IMAGE_COUNT,
            minimum_body_length: content::MINIMUM_BODY_LENGTH,
            humanize: true,
            overall_deadline_secs: content::OVERALL_DEADLINE_SECS,
            expansion_deadline_secs: content::EXPANSION_DEADLINE_SECS,
        }
    }
}

// =============================================================================
// Language Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Target language code (e.g. "ko")
    pub target: String,

    /// ASCII-letter ratio above which a field is re-translated
    pub ascii_ratio_threshold: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: language::DEFAULT_TARGET.to_string(),
            ascii_ratio_threshold: language::ASCII_RATIO_THRESHOLD,
        }
    }
}

// =============================================================================
// Budget Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Humanize calls allowed per session
    pub humanize_max_calls: u32,

    /// Cumulative humanize seconds allowed per session
    pub humanize_max_secs: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            humanize_max_calls: budget::HUMANIZE_MAX_CALLS,
            humanize_max_secs: budget::HUMANIZE_MAX_SECS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.backoff_ms, vec![700, 1200, 2000]);
        assert_eq!(config.language.ascii_ratio_threshold, 0.4);
    }

    #[test]
    fn test_invalid_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(matches!(config.validate(), Err(ContentError::Config(_))));
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = Config::default();
        config.language.ascii_ratio_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_target_language() {
        let mut config = Config::default();
        config.language.target = "klingon".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("language.target"));
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut config = Config::default();
        config.content.chapter_count = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chapter_count"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!format!("{:?}", config.llm).contains("sk-secret"));
    }
}
