//! AI Integration Layer
//!
//! Chat-completion providers and the resilient client that wraps them:
//! retry policy, deadlines, JSON repair, language detection and the
//! soft budget for optional polish passes.

pub mod budget;
pub mod client;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use budget::{BudgetStats, SharedBudget, SoftBudget};
pub use client::{AttemptRecord, CompletionErrorKind, CompletionResult, StructuredCompletionClient};
pub use prompt::{PromptBuilder, PromptSection};
pub use provider::{
    CompletionProvider, CompletionRequest, OllamaProvider, OpenAiProvider, ResponseFormat,
    SharedProvider, create_provider,
};
pub use retry::RetryPolicy;
pub use timeout::{with_timeout, with_timeout_map};
pub use validation::{
    JsonRepairer, ParseOutcome, ParseStage, ascii_ratio, is_mostly_foreign, looks_like_json,
    parse_structured,
};
