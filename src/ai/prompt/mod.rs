//! Prompt Builder
//!
//! Section-based construction of system and user instructions so every
//! package, follow-up and polish prompt shares one layout.
//!
//! ## Sections
//!
//! 1. **Role**: who the model is writing as
//! 2. **Rules**: bulleted constraints under a bracketed header
//! 3. **Objectives**: numbered goals
//! 4. **Fields**: `[key] value` lines describing the request
//! 5. **Text**: free text with an optional header
//! 6. **Focus**: the single thing the answer must contain

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    Role(String),
    Rules { header: String, items: Vec<String> },
    Objectives(Vec<String>),
    /// Ordered `[key] value` lines
    Fields(Vec<(String, String)>),
    Text {
        header: Option<String>,
        content: String,
    },
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
    Custom(String),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, description: &str) -> Self {
        self.sections.push(PromptSection::Role(description.to_string()));
        self
    }

    /// Bulleted rule list, e.g. `[persona / voice rules]`
    pub fn rules(mut self, header: &str, items: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Rules {
            header: header.to_string(),
            items: items.into_iter().map(String::from).collect(),
        });
        self
    }

    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a `[key] value` line, appending to the last field block if any
    pub fn field(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        let pair = (key.to_string(), value.to_string());
        match self.sections.last_mut() {
            Some(PromptSection::Fields(fields)) => fields.push(pair),
            _ => self.sections.push(PromptSection::Fields(vec![pair])),
        }
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    pub fn custom(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Custom(content.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role(description) => {
                    prompt.push_str(&description);
                    prompt.push_str("\n\n");
                }
                PromptSection::Rules { header, items } => {
                    prompt.push_str(&format!("[{}]\n", header));
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Objectives(objectives) => {
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push('\n');
                }
                PromptSection::Fields(fields) => {
                    for (key, value) in fields {
                        prompt.push_str(&format!("[{}] {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("[{}]\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str(&format!("IMPORTANT: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push('\n');
                }
                PromptSection::Custom(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_and_role() {
        let prompt = PromptBuilder::new()
            .rules("persona / voice rules", vec!["존대", "짧은 문장"])
            .role("You are a seasoned Korean YouTube scriptwriter.")
            .build();

        assert!(prompt.starts_with("[persona / voice rules]\n- 존대\n- 짧은 문장"));
        assert!(prompt.ends_with("scriptwriter."));
    }

    #[test]
    fn test_objectives_numbered() {
        let prompt = PromptBuilder::new()
            .objectives(vec!["Write titles", "Write chapters"])
            .build();

        assert!(prompt.contains("1. Write titles"));
        assert!(prompt.contains("2. Write chapters"));
    }

    #[test]
    fn test_fields_keep_order_and_merge() {
        let prompt = PromptBuilder::new()
            .field("topic", "무릎 통증")
            .field("N", 5)
            .build();

        assert_eq!(prompt, "[topic] 무릎 통증\n[N] 5");
    }

    #[test]
    fn test_separate_field_blocks() {
        let prompt = PromptBuilder::new()
            .field("a", 1)
            .text("middle")
            .field("b", 2)
            .build();

        assert_eq!(prompt, "[a] 1\n\nmiddle\n\n[b] 2");
    }

    #[test]
    fn test_section_and_focus() {
        let prompt = PromptBuilder::new()
            .section("schema", "{\"titles\": []}")
            .focus("Return STRICT JSON ONLY.", vec!["No markdown"])
            .build();

        assert!(prompt.contains("[schema]\n{\"titles\": []}"));
        assert!(prompt.contains("IMPORTANT: Return STRICT JSON ONLY.\n- No markdown"));
    }

    #[test]
    fn test_empty_builder() {
        assert!(PromptBuilder::new().is_empty());
        assert_eq!(PromptBuilder::new().build(), "");
    }
}
