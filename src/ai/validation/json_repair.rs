//! JSON Extraction and Repair
//!
//! Tiered parsing for LLM output that should be a JSON object:
//!
//! 1. Strict parse of the whole text (after fence/BOM stripping)
//! 2. Strict parse of the outermost brace-delimited substring
//! 3. Levelled repairs on that substring:
//!    trailing commas, truncated strings, control characters, unbalanced brackets
//!
//! Only JSON *objects* count as structured data. Arrays and scalars are
//! reported as [`ParseOutcome::Malformed`].

use serde_json::{Map, Value};
use tracing::{debug, warn};

// =============================================================================
// Outcome
// =============================================================================

/// Which tier produced the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Direct,
    Extracted,
    Repaired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed {
        object: Map<String, Value>,
        stage: ParseStage,
    },
    Malformed,
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }

    pub fn into_object(self) -> Option<Map<String, Value>> {
        match self {
            Self::Parsed { object, .. } => Some(object),
            Self::Malformed => None,
        }
    }

    pub fn stage(&self) -> Option<ParseStage> {
        match self {
            Self::Parsed { stage, .. } => Some(*stage),
            Self::Malformed => None,
        }
    }
}

/// Parse LLM output into a JSON object using every local tier
pub fn parse_structured(raw: &str) -> ParseOutcome {
    JsonRepairer::new().parse(raw)
}

/// Whether text looks like it was meant to be JSON
pub fn looks_like_json(raw: &str) -> bool {
    let cleaned = JsonRepairer::new().preprocess(raw);
    cleaned.starts_with('{') || cleaned.starts_with('[')
}

// =============================================================================
// JsonRepairer
// =============================================================================

pub struct JsonRepairer {
    max_repair_attempts: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: 3,
        }
    }

    pub fn parse(&self, raw: &str) -> ParseOutcome {
        let cleaned = self.preprocess(raw);
        if cleaned.is_empty() {
            return ParseOutcome::Malformed;
        }

        if let Some(object) = parse_object(&cleaned) {
            return ParseOutcome::Parsed {
                object,
                stage: ParseStage::Direct,
            };
        }

        let Some(candidate) = self.outermost_object(&cleaned) else {
            debug!("No opening brace in response");
            return ParseOutcome::Malformed;
        };

        if let Some(object) = parse_object(candidate) {
            debug!("JSON object extracted from surrounding text");
            return ParseOutcome::Parsed {
                object,
                stage: ParseStage::Extracted,
            };
        }

        for level in 1..=self.max_repair_attempts {
            let repaired = self.repair_attempt(candidate, level);
            if let Some(object) = parse_object(&repaired) {
                warn!(level, "JSON repaired");
                return ParseOutcome::Parsed {
                    object,
                    stage: ParseStage::Repaired,
                };
            }
        }

        debug!(
            preview = %crate::types::preview(&cleaned, 120),
            "Response is not recoverable as a JSON object"
        );
        ParseOutcome::Malformed
    }

    fn preprocess(&self, raw: &str) -> String {
        let s = raw.trim().trim_start_matches('\u{feff}');
        self.strip_code_fences(s).trim().to_string()
    }

    fn strip_code_fences(&self, s: &str) -> String {
        let mut result = s;

        if result.starts_with("```")
            && let Some(first_newline) = result.find('\n')
        {
            result = &result[first_newline + 1..];
        }

        if let Some(stripped) = result.trim_end().strip_suffix("```") {
            result = stripped.trim_end();
        }

        result.to_string()
    }

    /// First `{` through its matching `}`, or through the end of the text
    /// when the object was cut off
    fn outermost_object<'a>(&self, s: &'a str) -> Option<&'a str> {
        let start = s.find('{')?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(&s[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }

        Some(&s[start..])
    }

    /// Attempt repair with increasing aggressiveness
    fn repair_attempt(&self, s: &str, level: usize) -> String {
        match level {
            1 => self.balance_brackets(&self.fix_trailing_commas(s)),
            2 => {
                let result = self.fix_trailing_commas(s);
                let result = self.fix_truncated_strings(&result);
                self.balance_brackets(&result)
            }
            _ => {
                let result = self.fix_trailing_commas(s);
                let result = self.remove_control_chars(&result);
                let result = self.fix_truncated_strings(&result);
                let result = self.strip_dangling_tail(&result);
                self.balance_brackets(&result)
            }
        }
    }

    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }
            result.push(ch);
        }

        result
    }

    /// Close whatever strings, arrays and objects are still open, innermost first
    fn balance_brackets(&self, s: &str) -> String {
        let mut result = s.to_string();
        let mut stack = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => stack.push('}'),
                '[' if !in_string => stack.push(']'),
                '}' | ']' if !in_string => {
                    stack.pop();
                }
                _ => {}
            }
        }

        if in_string {
            result.push('"');
        }
        while let Some(closer) = stack.pop() {
            result.push(closer);
        }

        result
    }

    fn fix_truncated_strings(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 10);
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => {
                    escape = true;
                    result.push(ch);
                }
                '"' => {
                    in_string = !in_string;
                    result.push(ch);
                }
                '\n' | '\r' if in_string => {
                    result.push('"');
                    in_string = false;
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        if in_string {
            result.push('"');
        }

        result
    }

    fn remove_control_chars(&self, s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }

    /// Drop a trailing `,` or `"key":` left behind by a cut-off response
    fn strip_dangling_tail(&self, s: &str) -> String {
        let mut result = s.trim_end().to_string();
        loop {
            if let Some(stripped) = result.strip_suffix(',') {
                result = stripped.trim_end().to_string();
            } else if let Some(stripped) = result.strip_suffix(':') {
                let key = stripped.trim_end();
                let cut = key
                    .strip_suffix('"')
                    .and_then(|k| k.rfind('"'))
                    .unwrap_or(key.len());
                result = key[..cut].trim_end().to_string();
            } else {
                break;
            }
        }
        result
    }
}

fn parse_object(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let outcome = parse_structured(r#"{"key": "value"}"#);
        assert_eq!(outcome.stage(), Some(ParseStage::Direct));
        assert_eq!(outcome.into_object().unwrap()["key"], "value");
    }

    #[test]
    fn test_strip_code_fences() {
        let outcome = parse_structured("```json\n{\"key\": \"value\"}\n```");
        assert_eq!(outcome.stage(), Some(ParseStage::Direct));
    }

    #[test]
    fn test_extract_from_mixed() {
        let input = r#"Here's the package:
{"titles": ["a", "b"], "body": "text with } brace"}
Hope this helps!"#;
        let outcome = parse_structured(input);
        assert_eq!(outcome.stage(), Some(ParseStage::Extracted));
        let object = outcome.into_object().unwrap();
        assert_eq!(object["body"], "text with } brace");
    }

    #[test]
    fn test_fix_trailing_comma() {
        let outcome = parse_structured(r#"{"titles": ["a", "b",],}"#);
        assert_eq!(outcome.stage(), Some(ParseStage::Repaired));
        assert!(outcome.into_object().unwrap()["titles"].is_array());
    }

    #[test]
    fn test_comma_inside_string_is_kept() {
        let outcome = parse_structured(r#"{"body": "one, }", "x": [1,]}"#);
        let object = outcome.into_object().unwrap();
        assert_eq!(object["body"], "one, }");
    }

    #[test]
    fn test_balance_brackets() {
        let outcome = parse_structured(r#"{"chapters": [{"title": "t"}"#);
        assert_eq!(outcome.stage(), Some(ParseStage::Repaired));
        assert!(outcome.into_object().unwrap()["chapters"].is_array());
    }

    #[test]
    fn test_truncated_string() {
        let input = r#"{"name": "unterminated
, "other": "value"}"#;
        assert!(parse_structured(input).is_parsed());
    }

    #[test]
    fn test_dangling_key_after_cutoff() {
        let input = r#"Sure! {"titles": ["a"], "body":"#;
        let object = parse_structured(input).into_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("titles"));
    }

    #[test]
    fn test_prose_is_malformed() {
        assert_eq!(
            parse_structured("죄송합니다. 요청을 처리할 수 없습니다."),
            ParseOutcome::Malformed
        );
        assert_eq!(parse_structured(""), ParseOutcome::Malformed);
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        assert_eq!(parse_structured(r#"["a", "b"]"#), ParseOutcome::Malformed);
        assert_eq!(parse_structured("42"), ParseOutcome::Malformed);
    }

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json("```json\n{\"a\":1}\n```"));
        assert!(!looks_like_json("plain prose"));
    }
}
