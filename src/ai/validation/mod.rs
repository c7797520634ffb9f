//! Response validation
//!
//! - Tiered JSON extraction and repair for LLM output
//! - Script-ratio language detection for target-language checks

mod json_repair;
mod language;

pub use json_repair::{JsonRepairer, ParseOutcome, ParseStage, looks_like_json, parse_structured};
pub use language::{ascii_ratio, is_mostly_foreign, list_is_mostly_foreign};
