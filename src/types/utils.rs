//! Shared utility functions for JSON extraction and text handling.
//!
//! ## JSON Extraction Helpers
//!
//! Ergonomic helpers for extracting values from `serde_json::Value`:
//! - `json_string` - Extract non-blank strings
//! - `json_string_array` - Extract string arrays

use serde_json::Value;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract a trimmed, non-blank string from JSON value by key.
#[inline]
pub fn json_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract string array from JSON value by key, skipping blank entries.
#[inline]
pub fn json_string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// String Utilities
// =============================================================================

/// Character count (not bytes); length constraints are stated in characters.
#[inline]
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// First `max_chars` characters, for log previews.
pub fn preview(s: &str, max_chars: usize) -> String {
    if char_count(s) <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_string_skips_blank() {
        let v = json!({"a": "  hi ", "b": "   ", "c": 3});
        assert_eq!(json_string(&v, "a").as_deref(), Some("hi"));
        assert_eq!(json_string(&v, "b"), None);
        assert_eq!(json_string(&v, "c"), None);
        assert_eq!(json_string(&v, "missing"), None);
    }

    #[test]
    fn test_json_string_array() {
        let v = json!({"tags": ["#a", "", 7, " #b "]});
        assert_eq!(json_string_array(&v, "tags"), vec!["#a", "#b"]);
        assert!(json_string_array(&v, "none").is_empty());
    }

    #[test]
    fn test_char_count_is_unicode_aware() {
        assert_eq!(char_count("음식"), 2);
        assert_eq!("음식".len(), 6);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("가나다라마", 2), "가나…");
    }
}
