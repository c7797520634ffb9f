//! Generation options
//!
//! Enumerated settings a caller passes to
//! [`ContentAssembler::assemble`](super::ContentAssembler::assemble).

use serde::Serialize;

use crate::config::Config;

// =============================================================================
// Style
// =============================================================================

/// Tone of the generated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// "시니어 친화형"
    #[serde(rename = "senior")]
    SeniorFriendly,
    /// "전문가형"
    #[default]
    Expert,
    /// "친근한 설명형"
    Casual,
}

impl Style {
    /// Label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            Style::SeniorFriendly => "시니어 친화형",
            Style::Expert => "전문가형",
            Style::Casual => "친근한 설명형",
        }
    }

    pub fn directive(&self) -> &'static str {
        match self {
            Style::SeniorFriendly => {
                "쉬운 단어와 짧은 문장으로, 어려운 용어는 바로 풀어서 설명합니다."
            }
            Style::Expert => "근거와 수치를 곁들여 정확하게, 단정적인 과장은 피합니다.",
            Style::Casual => "옆집 이웃에게 말하듯 편안하게, 예시를 넉넉히 씁니다.",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Style::SeniorFriendly => write!(f, "senior"),
            Style::Expert => write!(f, "expert"),
            Style::Casual => write!(f, "casual"),
        }
    }
}

impl std::str::FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "senior" | "senior-friendly" | "시니어 친화형" => Ok(Style::SeniorFriendly),
            "expert" | "전문가형" => Ok(Style::Expert),
            "casual" | "친근한 설명형" => Ok(Style::Casual),
            _ => Err(format!(
                "Unknown style: {}. Valid values: senior, expert, casual",
                s
            )),
        }
    }
}

// =============================================================================
// Mode
// =============================================================================

/// Mode as chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    #[default]
    Informational,
    Promotional,
    /// Decide from topic keywords
    Auto,
}

impl ModeSelection {
    pub fn resolve(&self, topic: &str, promo_keywords: &[String]) -> Mode {
        match self {
            ModeSelection::Informational => Mode::Informational,
            ModeSelection::Promotional => Mode::Promotional,
            ModeSelection::Auto => detect_mode(topic, promo_keywords),
        }
    }
}

impl std::fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeSelection::Informational => write!(f, "info"),
            ModeSelection::Promotional => write!(f, "promo"),
            ModeSelection::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for ModeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" | "informational" | "정보형" => Ok(ModeSelection::Informational),
            "promo" | "promotional" | "sales" | "영업형" => Ok(ModeSelection::Promotional),
            "auto" | "자동" => Ok(ModeSelection::Auto),
            _ => Err(format!(
                "Unknown mode: {}. Valid values: auto, info, promo",
                s
            )),
        }
    }
}

/// Resolved content mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Informational,
    Promotional,
}

impl Mode {
    /// Short tag embedded in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Informational => "info",
            Mode::Promotional => "sales",
        }
    }

    pub fn is_promotional(&self) -> bool {
        matches!(self, Mode::Promotional)
    }

    pub fn cta_directive(&self) -> &'static str {
        match self {
            Mode::Informational => "Info mode forbids any promotional call-to-action.",
            Mode::Promotional => "Sales mode allows ONE call-to-action at the very last line.",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Promotional when the topic contains any keyword
pub fn detect_mode(topic: &str, promo_keywords: &[String]) -> Mode {
    if promo_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| topic.contains(k.as_str()))
    {
        Mode::Promotional
    } else {
        Mode::Informational
    }
}

// =============================================================================
// Target Language
// =============================================================================

const KNOWN_LANGUAGES: &[(&str, &str, bool)] = &[
    ("ko", "Korean", false),
    ("ja", "Japanese", false),
    ("zh", "Chinese", false),
    ("en", "English", true),
    ("es", "Spanish", true),
    ("fr", "French", true),
    ("de", "German", true),
    ("pt", "Portuguese", true),
    ("it", "Italian", true),
    ("vi", "Vietnamese", true),
    ("id", "Indonesian", true),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetLanguage {
    code: &'static str,
}

impl TargetLanguage {
    pub fn korean() -> Self {
        Self { code: "ko" }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn entry(&self) -> Option<&'static (&'static str, &'static str, bool)> {
        KNOWN_LANGUAGES.iter().find(|(code, _, _)| *code == self.code)
    }

    pub fn display_name(&self) -> &'static str {
        self.entry().map(|(_, name, _)| *name).unwrap_or("Korean")
    }

    /// ASCII-ratio correction only makes sense for non-Latin scripts
    pub fn uses_latin_script(&self) -> bool {
        self.entry().is_some_and(|(_, _, latin)| *latin)
    }
}

impl Default for TargetLanguage {
    fn default() -> Self {
        Self::korean()
    }
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        KNOWN_LANGUAGES
            .iter()
            .find(|(code, name, _)| *code == wanted || name.to_lowercase() == wanted)
            .map(|(code, _, _)| TargetLanguage { code })
            .ok_or_else(|| {
                let codes: Vec<&str> = KNOWN_LANGUAGES.iter().map(|(c, _, _)| *c).collect();
                format!("Unknown language: {}. Valid values: {}", s, codes.join(", "))
            })
    }
}

// =============================================================================
// OptionsMap
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OptionsMap {
    pub style: Style,
    pub mode: ModeSelection,
    pub target_language: TargetLanguage,
    /// Chapter count for video packages
    pub target_item_count: usize,
    pub minimum_body_length: usize,
    /// Image prompt count for article packages
    pub image_count: usize,
    pub title_count: usize,
    pub hashtag_count: usize,
    pub humanize: bool,
    pub cta: String,
    pub persona: String,
    pub region: String,
    pub promo_keywords: Vec<String>,
    pub ascii_ratio_threshold: f64,
}

impl Default for OptionsMap {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OptionsMap {
    pub fn from_config(config: &Config) -> Self {
        let content = &config.content;
        Self {
            style: Style::default(),
            mode: ModeSelection::default(),
            target_language: config.language.target.parse().unwrap_or_default(),
            target_item_count: content.chapter_count,
            minimum_body_length: content.minimum_body_length,
            image_count: content.image_count,
            title_count: content.title_count,
            hashtag_count: content.hashtag_count,
            humanize: content.humanize,
            cta: content.cta.clone(),
            persona: content.persona.clone(),
            region: content.region.clone(),
            promo_keywords: content.promo_keywords.clone(),
            ascii_ratio_threshold: config.language.ascii_ratio_threshold,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_mode(mut self, mode: ModeSelection) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target_language(mut self, language: TargetLanguage) -> Self {
        self.target_language = language;
        self
    }

    pub fn with_item_count(mut self, count: usize) -> Self {
        self.target_item_count = count;
        self
    }

    pub fn with_minimum_body_length(mut self, chars: usize) -> Self {
        self.minimum_body_length = chars;
        self
    }

    pub fn with_image_count(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    pub fn with_humanize(mut self, humanize: bool) -> Self {
        self.humanize = humanize;
        self
    }

    pub fn with_cta(mut self, cta: impl Into<String>) -> Self {
        self.cta = cta.into();
        self
    }

    pub fn resolve_mode(&self, topic: &str) -> Mode {
        self.mode.resolve(topic, &self.promo_keywords)
    }

    /// Whether the ASCII-ratio language check applies
    pub fn checks_language(&self) -> bool {
        !self.target_language.uses_latin_script()
    }
}
