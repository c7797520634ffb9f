//! Retry Policy
//!
//! One configurable object describing how a completion is retried:
//! attempts per model, the backoff schedule, jitter, and the fallback model.
//! [`StructuredCompletionClient`](super::StructuredCompletionClient) consumes it;
//! it has no I/O of its own so it can be tested in isolation.

use std::time::Duration;

use rand::Rng;

use crate::config::{LlmConfig, RetryConfig};
use crate::constants::retry as retry_constants;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per model (primary, then fallback)
    pub max_attempts: u32,
    /// Delay before retry N is `backoff[N - 1]`, clamped to the last entry
    pub backoff: Vec<Duration>,
    /// Randomize each delay by up to ±25%
    pub jitter: bool,
    /// Model tried after the primary exhausts its attempts
    pub fallback_model: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_MAX_ATTEMPTS,
            backoff: retry_constants::BACKOFF_SCHEDULE_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            jitter: true,
            fallback_model: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, llm: &LlmConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts.max(1),
            backoff: retry
                .backoff_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            jitter: retry.jitter,
            fallback_model: llm.fallback_model.clone().filter(|m| !m.trim().is_empty()),
        }
    }

    /// Policy without any sleeping, for tests and local tooling
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Vec::new(),
            jitter: false,
            fallback_model: None,
        }
    }

    pub fn with_fallback(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    /// Models in the order they are tried
    pub fn models_for<'a>(&'a self, primary: &'a str) -> Vec<&'a str> {
        let mut models = vec![primary];
        if let Some(fallback) = self.fallback_model.as_deref()
            && fallback != primary
        {
            models.push(fallback);
        }
        models
    }

    /// Scheduled delay after failed attempt `attempt` (1-based), before jitter
    pub fn scheduled_delay(&self, attempt: u32) -> Duration {
        if self.backoff.is_empty() || attempt == 0 {
            return Duration::ZERO;
        }
        let idx = (attempt as usize - 1).min(self.backoff.len() - 1);
        self.backoff[idx]
    }

    /// Delay to sleep after failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.scheduled_delay(attempt);
        if self.jitter {
            apply_jitter(base)
        } else {
            base
        }
    }

    /// Upper bound on wall-clock time for one `execute` call
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let models = if self.fallback_model.is_some() { 2 } else { 1 };
        let sleeps: Duration = (1..self.max_attempts)
            .map(|a| self.scheduled_delay(a).mul_f64(1.0 + retry_constants::JITTER_FRACTION))
            .sum();
        (per_attempt * self.max_attempts + sleeps) * models
    }
}

/// ±25% random jitter using the thread-local RNG
fn apply_jitter(base: Duration) -> Duration {
    let spread_ms = (base.as_millis() as f64 * retry_constants::JITTER_FRACTION) as i64;
    if spread_ms == 0 {
        return base;
    }
    let offset = rand::rng().random_range(-spread_ms..=spread_ms);
    let ms = (base.as_millis() as i64 + offset).max(0) as u64;
    Duration::from_millis(ms)
}
