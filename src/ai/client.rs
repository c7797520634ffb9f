//! Structured Completion Client
//!
//! Wraps a [`CompletionProvider`] with per-attempt deadlines, a retry
//! schedule and a fallback model. Failures never escape as errors: when
//! every attempt on every model fails the caller receives a
//! [`CompletionResult`] with `succeeded == false`.
//!
//! ## Strategy
//!
//! 1. Build a fresh request for the current model
//! 2. Run it under the per-attempt timeout
//! 3. Blank text counts as a failure (usually transient)
//! 4. On a retryable failure, sleep per the schedule and try again
//! 5. On a non-retryable failure or exhausted budget, move to the fallback model
//! 6. Report `Exhausted` with the last observed category

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::provider::{CompletionRequest, SharedProvider};
use super::retry::RetryPolicy;
use super::timeout::with_timeout;
use crate::types::{ContentError, ErrorCategory, ErrorClassifier, LlmError};

// =============================================================================
// Result Types
// =============================================================================

/// Why a completion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    /// Every attempt on every configured model failed
    Exhausted { last_category: ErrorCategory },
}

impl std::fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted { last_category } => write!(f, "exhausted ({})", last_category),
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub model: String,
    /// 1-based attempt number within this model
    pub attempt: u32,
    pub success: bool,
    pub error: Option<LlmError>,
    pub duration_ms: u64,
}

/// Result of [`StructuredCompletionClient::execute`]. Read-only once built.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    raw_text: String,
    succeeded: bool,
    error_kind: Option<CompletionErrorKind>,
    model_used: Option<String>,
    attempts: Vec<AttemptRecord>,
    elapsed: Duration,
}

impl CompletionResult {
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error_kind(&self) -> Option<CompletionErrorKind> {
        self.error_kind
    }

    /// Model that produced the text, if any did
    pub fn model_used(&self) -> Option<&str> {
        self.model_used.as_deref()
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the answer came from a model other than the first one tried
    pub fn used_fallback(&self) -> bool {
        match (self.model_used.as_deref(), self.attempts.first()) {
            (Some(used), Some(first)) => used != first.model,
            _ => false,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Provider plus retry policy. Cheap to clone.
#[derive(Clone)]
pub struct StructuredCompletionClient {
    provider: SharedProvider,
    policy: RetryPolicy,
}

impl StructuredCompletionClient {
    pub fn new(provider: SharedProvider, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run `request` against the primary model, then the fallback model.
    ///
    /// Never returns an error; see [`CompletionResult::succeeded`].
    #[instrument(skip(self, request), fields(model = %request.model_id, provider = %self.provider.name()))]
    pub async fn execute(&self, request: &CompletionRequest) -> CompletionResult {
        let start = Instant::now();
        let provider_name = self.provider.name().to_string();
        let mut attempts = Vec::new();
        let mut last_category = ErrorCategory::Unknown;

        for model in self.policy.models_for(&request.model_id) {
            for attempt in 1..=self.policy.max_attempts {
                let attempt_request = request.for_model(model);
                let attempt_start = Instant::now();

                debug!(model, attempt, max_attempts = self.policy.max_attempts, "Completion attempt");

                let outcome = with_timeout(
                    attempt_request.timeout,
                    self.provider.complete(&attempt_request),
                    "completion attempt",
                )
                .await
                .and_then(|text| {
                    if text.trim().is_empty() {
                        Err(ContentError::llm_with_category(
                            ErrorCategory::ParseError,
                            "empty completion",
                        ))
                    } else {
                        Ok(text)
                    }
                });
                let duration_ms = attempt_start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(text) => {
                        attempts.push(AttemptRecord {
                            model: model.to_string(),
                            attempt,
                            success: true,
                            error: None,
                            duration_ms,
                        });
                        info!(model, attempts = attempts.len(), "Completion succeeded");
                        return CompletionResult {
                            raw_text: text,
                            succeeded: true,
                            error_kind: None,
                            model_used: Some(model.to_string()),
                            attempts,
                            elapsed: start.elapsed(),
                        };
                    }
                    Err(err) => {
                        let classified = ErrorClassifier::classify_error(&err, &provider_name);
                        warn!(
                            model,
                            attempt,
                            category = %classified.category,
                            error = %err,
                            "Completion attempt failed"
                        );
                        last_category = classified.category;
                        let retryable = classified.is_retryable();
                        attempts.push(AttemptRecord {
                            model: model.to_string(),
                            attempt,
                            success: false,
                            error: Some(classified),
                            duration_ms,
                        });

                        if !retryable {
                            info!(model, "Non-retryable failure, moving to next model");
                            break;
                        }
                        if attempt < self.policy.max_attempts {
                            let delay = self.policy.delay_for(attempt);
                            debug!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                            sleep(delay).await;
                        }
                    }
                }
            }
        }

        warn!(
            attempts = attempts.len(),
            category = %last_category,
            "All completion attempts failed"
        );
        CompletionResult {
            raw_text: String::new(),
            succeeded: false,
            error_kind: Some(CompletionErrorKind::Exhausted { last_category }),
            model_used: None,
            attempts,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::{Reply, ScriptedProvider};
    use std::sync::Arc;

    fn request() -> CompletionRequest {
        CompletionRequest::new("system", "user", "primary")
    }

    fn client(provider: Arc<ScriptedProvider>, policy: RetryPolicy) -> StructuredCompletionClient {
        StructuredCompletionClient::new(provider, policy)
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let provider = Arc::new(ScriptedProvider::always(Reply::text("{\"a\":1}")));
        let result = client(provider.clone(), RetryPolicy::no_delay(3))
            .execute(&request())
            .await;

        assert!(result.succeeded());
        assert_eq!(result.raw_text(), "{\"a\":1}");
        assert_eq!(result.model_used(), Some("primary"));
        assert_eq!(result.attempt_count(), 1);
        assert!(result.error_kind().is_none());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let provider = Arc::new(ScriptedProvider::sequence(vec![
            Reply::Fail(ErrorCategory::Network),
            Reply::Fail(ErrorCategory::Transient),
            Reply::text("ok"),
        ]));
        let result = client(provider.clone(), RetryPolicy::no_delay(3))
            .execute(&request())
            .await;

        assert!(result.succeeded());
        assert_eq!(result.attempt_count(), 3);
        assert!(!result.used_fallback());
        assert!(!result.attempts()[0].success);
        assert!(result.attempts()[2].success);
    }

    #[tokio::test]
    async fn test_blank_text_is_retried() {
        let provider = Arc::new(ScriptedProvider::sequence(vec![
            Reply::text("   \n"),
            Reply::text("filled"),
        ]));
        let result = client(provider, RetryPolicy::no_delay(3))
            .execute(&request())
            .await;

        assert!(result.succeeded());
        assert_eq!(result.raw_text(), "filled");
        let first_error = result.attempts()[0].error.as_ref().unwrap();
        assert_eq!(first_error.category, ErrorCategory::ParseError);
    }

    #[tokio::test]
    async fn test_falls_back_after_primary_exhausted() {
        let provider = Arc::new(ScriptedProvider::new(|req, _| {
            if req.model_id == "backup" {
                Reply::text("from backup")
            } else {
                Reply::Fail(ErrorCategory::Unavailable)
            }
        }));
        let policy = RetryPolicy::no_delay(3).with_fallback("backup");
        let result = client(provider.clone(), policy).execute(&request()).await;

        assert!(result.succeeded());
        assert_eq!(result.model_used(), Some("backup"));
        assert!(result.used_fallback());
        assert_eq!(result.attempt_count(), 4);

        let models: Vec<String> = provider.calls().into_iter().map(|r| r.model_id).collect();
        assert_eq!(models, vec!["primary", "primary", "primary", "backup"]);
    }

    #[tokio::test]
    async fn test_exhausted_returns_failure_result() {
        let provider = Arc::new(ScriptedProvider::always(Reply::Fail(ErrorCategory::Network)));
        let policy = RetryPolicy::no_delay(2).with_fallback("backup");
        let result = client(provider.clone(), policy).execute(&request()).await;

        assert!(!result.succeeded());
        assert_eq!(result.raw_text(), "");
        assert_eq!(result.model_used(), None);
        assert_eq!(
            result.error_kind(),
            Some(CompletionErrorKind::Exhausted {
                last_category: ErrorCategory::Network
            })
        );
        // same budget on both models
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_skips_to_fallback() {
        let provider = Arc::new(ScriptedProvider::new(|req, _| {
            if req.model_id == "backup" {
                Reply::text("ok")
            } else {
                Reply::Fail(ErrorCategory::Auth)
            }
        }));
        let policy = RetryPolicy::no_delay(3).with_fallback("backup");
        let result = client(provider.clone(), policy).execute(&request()).await;

        assert!(result.succeeded());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_failure() {
        let provider = Arc::new(ScriptedProvider::sequence(vec![Reply::Hang, Reply::text("late")]));
        let req = request().with_timeout(Duration::from_millis(20));
        let result = client(provider, RetryPolicy::no_delay(2)).execute(&req).await;

        assert!(result.succeeded());
        assert_eq!(result.raw_text(), "late");
        let first_error = result.attempts()[0].error.as_ref().unwrap();
        assert_eq!(first_error.category, ErrorCategory::Network);
    }

    #[tokio::test]
    async fn test_each_attempt_gets_fresh_request() {
        let provider = Arc::new(ScriptedProvider::always(Reply::Fail(ErrorCategory::Transient)));
        let policy = RetryPolicy::no_delay(2).with_fallback("backup");
        let req = request().with_temperature(0.2);
        client(provider.clone(), policy).execute(&req).await;

        for call in provider.calls() {
            assert_eq!(call.system_instructions, "system");
            assert_eq!(call.user_instructions, "user");
            assert!((call.temperature - 0.2).abs() < f32::EPSILON);
        }
        assert_eq!(req.model_id, "primary");
    }
}
