//! English image prompts from Korean option labels
//!
//! Image prompts are always English, always describe Korean subjects and
//! always end with the no-text suffix. Age group and gender can be inferred
//! from the topic; every other descriptor comes from a lookup table keyed by
//! the Korean label the user picked. Unknown labels fall back to the table
//! default.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Appended to every image prompt
pub const NO_TEXT_SUFFIX: &str = "no text overlay, no captions, no watermarks, no logos.";

/// Label meaning "infer from topic"
pub const AUTO_LABEL: &str = "자동";

type Table = &'static [(&'static str, &'static str)];

const AGE_TABLE: Table = &[
    ("유아", "toddlers"),
    ("아동", "children"),
    ("청소년", "teenagers"),
    ("20대", "people in their 20s"),
    ("30대", "people in their 30s"),
    ("40대", "people in their 40s"),
    ("50대", "people in their 50s"),
    ("60대", "people in their 60s"),
    ("70대", "people in their 70s"),
    ("성인", "adults"),
];

const GENDER_TABLE: Table = &[
    ("남성", "Korean man"),
    ("여성", "Korean woman"),
    ("혼합", "Korean men and women"),
];

const PLACE_TABLE: Table = &[
    ("한국 가정 거실", "modern Korean home living room interior"),
    ("한국 아파트 단지", "Korean apartment complex outdoor area"),
    ("한국 동네 공원", "local Korean neighborhood park"),
    (
        "한국 병원/검진센터",
        "Korean medical clinic or health screening center interior",
    ),
    ("한국형 주방/식탁", "modern Korean kitchen and dining table"),
];

const MOOD_TABLE: Table = &[
    ("따뜻한", "warm"),
    ("밝은", "bright"),
    ("차분한", "calm"),
    ("활기찬", "energetic"),
];

const SHOT_TABLE: Table = &[
    ("클로즈업", "close-up"),
    ("상반신", "medium shot"),
    ("전신", "full body shot"),
    ("탑뷰/테이블샷", "top view table shot"),
];

const STYLE_TABLE: Table = &[
    ("사진 실사", "realistic photography, high resolution"),
    ("시네마틱", "cinematic photo style"),
    ("잡지 화보", "editorial magazine style"),
    ("자연광", "natural lighting"),
];

fn lookup(table: Table, label: &str, default: &'static str) -> &'static str {
    table
        .iter()
        .find(|(ko, _)| *ko == label.trim())
        .map(|(_, en)| *en)
        .unwrap_or(default)
}

fn labels(table: Table) -> Vec<&'static str> {
    table.iter().map(|(ko, _)| *ko).collect()
}

pub fn age_labels() -> Vec<&'static str> {
    labels(AGE_TABLE)
}

pub fn place_labels() -> Vec<&'static str> {
    labels(PLACE_TABLE)
}

pub fn mood_labels() -> Vec<&'static str> {
    labels(MOOD_TABLE)
}

pub fn shot_labels() -> Vec<&'static str> {
    labels(SHOT_TABLE)
}

pub fn style_labels() -> Vec<&'static str> {
    labels(STYLE_TABLE)
}

// =============================================================================
// Demographics
// =============================================================================

/// First match wins, so narrower groups come first
static AGE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(유아|영유아|신생아)", "유아"),
        (r"(아동|초등|초등학생|키즈)", "아동"),
        (r"(청소년|중학생|고등학생|10대|틴|티네이저)", "청소년"),
        (r"(20대|2030)", "20대"),
        (r"(30대|3040)", "30대"),
        (r"(40대|4050)", "40대"),
        (r"(50대|장년|중년)", "50대"),
        (r"(60대|노년|시니어)", "60대"),
        (r"(70대|고령)", "70대"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("static age pattern"), label))
    .collect()
});

static MALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(남성|남자|아빠|형|삼촌|신사|남편|중년남|아재)").expect("static gender pattern")
});

static FEMALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(여성|여자|엄마|언니|이모|숙녀|아내|중년여|여성전용)")
        .expect("static gender pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Demographics {
    /// Age group label, e.g. "50대"
    pub age_group: String,
    /// "남성", "여성" or "혼합"
    pub gender: String,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age_group: "성인".to_string(),
            gender: "혼합".to_string(),
        }
    }
}

impl std::fmt::Display for Demographics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "age={}, gender={}", self.age_group, self.gender)
    }
}

pub fn detect_demographics(topic: &str) -> Demographics {
    let text = topic.to_lowercase();
    let mut demographics = Demographics::default();

    if let Some((_, label)) = AGE_PATTERNS.iter().find(|(re, _)| re.is_match(&text)) {
        demographics.age_group = label.to_string();
    }

    if MALE_PATTERN.is_match(&text) {
        demographics.gender = "남성".to_string();
    } else if FEMALE_PATTERN.is_match(&text) {
        demographics.gender = "여성".to_string();
    }

    demographics
}

// =============================================================================
// Image Style
// =============================================================================

/// Korean option labels describing the picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageStyle {
    pub demographics: Demographics,
    pub place: String,
    pub mood: String,
    pub shot: String,
    pub style: String,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            demographics: Demographics::default(),
            place: "한국 가정 거실".to_string(),
            mood: "따뜻한".to_string(),
            shot: "상반신".to_string(),
            style: "사진 실사".to_string(),
        }
    }
}

impl ImageStyle {
    /// Defaults with demographics inferred from the topic
    pub fn for_topic(topic: &str) -> Self {
        Self {
            demographics: detect_demographics(topic),
            ..Self::default()
        }
    }

    /// Override the inferred age group unless `label` is "자동"
    pub fn with_age(mut self, label: &str) -> Self {
        if label.trim() != AUTO_LABEL {
            self.demographics.age_group = label.trim().to_string();
        }
        self
    }

    /// Override the inferred gender unless `label` is "자동"
    pub fn with_gender(mut self, label: &str) -> Self {
        if label.trim() != AUTO_LABEL {
            self.demographics.gender = label.trim().to_string();
        }
        self
    }

    pub fn with_place(mut self, label: &str) -> Self {
        self.place = label.trim().to_string();
        self
    }

    pub fn with_mood(mut self, label: &str) -> Self {
        self.mood = label.trim().to_string();
        self
    }

    pub fn with_shot(mut self, label: &str) -> Self {
        self.shot = label.trim().to_string();
        self
    }

    pub fn with_style(mut self, label: &str) -> Self {
        self.style = label.trim().to_string();
        self
    }
}

/// Full English prompt for one picture about `subject_en`
pub fn build_image_prompt(subject_en: &str, style: &ImageStyle) -> String {
    let age = lookup(AGE_TABLE, &style.demographics.age_group, "adults");
    let gender = lookup(GENDER_TABLE, &style.demographics.gender, "Korean men and women");
    let place = lookup(PLACE_TABLE, &style.place, "modern Korean interior");
    let shot = lookup(SHOT_TABLE, &style.shot, "medium shot");
    let mood = lookup(MOOD_TABLE, &style.mood, "warm");
    let look = lookup(STYLE_TABLE, &style.style, "realistic photography, high resolution");

    format!(
        "{gender} {age} at a {place}, {shot}, {mood} mood, {look}. \
         Context: {}. natural lighting, high contrast, {NO_TEXT_SUFFIX}",
        subject_en.trim()
    )
}

/// Video thumbnail prompt, built locally
pub fn thumbnail_prompt(topic: &str, style: &ImageStyle) -> String {
    build_image_prompt(
        &format!("YouTube thumbnail for topic: {}. Korean home context, healthy living", topic.trim()),
        style,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_age_and_gender() {
        let d = detect_demographics("50대 이후 조심해야 할 음식 TOP5");
        assert_eq!(d.age_group, "50대");
        assert_eq!(d.gender, "혼합");

        let d = detect_demographics("초등학생 엄마가 알아야 할 간식");
        assert_eq!(d.age_group, "아동");
        assert_eq!(d.gender, "여성");

        let d = detect_demographics("시니어 남성 근력 운동");
        assert_eq!(d.age_group, "60대");
        assert_eq!(d.gender, "남성");
    }

    #[test]
    fn test_detect_defaults() {
        assert_eq!(detect_demographics("욕실 타일 교체"), Demographics::default());
    }

    #[test]
    fn test_build_prompt_uses_tables() {
        let style = ImageStyle::default()
            .with_age("60대")
            .with_gender("여성")
            .with_place("한국 동네 공원")
            .with_mood("밝은")
            .with_shot("전신")
            .with_style("시네마틱");
        let prompt = build_image_prompt("morning walk", &style);

        assert!(prompt.starts_with("Korean woman people in their 60s at a local Korean neighborhood park"));
        assert!(prompt.contains("full body shot, bright mood, cinematic photo style."));
        assert!(prompt.contains("Context: morning walk."));
        assert!(prompt.ends_with(NO_TEXT_SUFFIX));
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        let style = ImageStyle::default().with_place("달 표면").with_mood("???");
        let prompt = build_image_prompt("x", &style);
        assert!(prompt.contains("modern Korean interior"));
        assert!(prompt.contains("warm mood"));
    }

    #[test]
    fn test_auto_label_keeps_inferred() {
        let style = ImageStyle::for_topic("30대 남자 다이어트")
            .with_age(AUTO_LABEL)
            .with_gender(AUTO_LABEL);
        assert_eq!(style.demographics.age_group, "30대");
        assert_eq!(style.demographics.gender, "남성");
    }

    #[test]
    fn test_thumbnail_prompt() {
        let prompt = thumbnail_prompt("무릎 관리", &ImageStyle::default());
        assert!(prompt.contains("YouTube thumbnail for topic: 무릎 관리."));
        assert!(prompt.ends_with(NO_TEXT_SUFFIX));
    }

    #[test]
    fn test_label_lists() {
        assert_eq!(age_labels().len(), 10);
        assert!(place_labels().contains(&"한국형 주방/식탁"));
        assert_eq!(mood_labels().len(), 4);
        assert_eq!(shot_labels().len(), 4);
        assert_eq!(style_labels().len(), 4);
    }
}
