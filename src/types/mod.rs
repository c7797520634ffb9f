pub mod error;
pub mod utils;

pub use error::{ContentError, ErrorCategory, ErrorClassifier, LlmError, Result};
pub use utils::{char_count, json_string, json_string_array, preview};
