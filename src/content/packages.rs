//! Package definitions
//!
//! A package is one schema plus the instructions that ask a model to fill
//! it. Video packages carry titles, a description, chapters with scripts,
//! chapter image prompts and hashtags; article packages carry titles, a long
//! body with image markers, image prompts and tags. Placeholders double as
//! the deterministic fallback copy used when no model reply is usable.

use serde::Serialize;

use super::image_prompt::detect_demographics;
use super::options::{Mode, OptionsMap};
use super::schema::{ContentSchema, FieldSpec, ObjectKey};
use crate::ai::PromptBuilder;

const IMAGE_HINT: &str = "(EN only, no text overlay)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Video,
    Article,
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageKind::Video => write!(f, "video"),
            PackageKind::Article => write!(f, "article"),
        }
    }
}

impl PackageKind {
    /// Export file name
    pub fn file_name(&self) -> &'static str {
        match self {
            PackageKind::Video => "youtube_package.txt",
            PackageKind::Article => "blog_package.md",
        }
    }

    pub fn schema(&self, options: &OptionsMap) -> ContentSchema {
        match self {
            PackageKind::Video => video_schema(options),
            PackageKind::Article => article_schema(options),
        }
    }

    /// System and user instructions for the primary request
    pub fn instructions(
        &self,
        topic: &str,
        options: &OptionsMap,
        mode: Mode,
        schema: &ContentSchema,
    ) -> (String, String) {
        let system = match self {
            PackageKind::Video => video_system(options, mode),
            PackageKind::Article => article_system(options, mode),
        };

        let mut user = PromptBuilder::new()
            .field("topic", topic.trim())
            .field("tone", options.style.label())
            .field("mode", mode.as_str());
        if *self == PackageKind::Video {
            user = user.field("N", options.target_item_count);
        }
        let user = user
            .field("demographics", detect_demographics(topic))
            .section("schema", &schema.skeleton())
            .build();

        (system, user)
    }
}

/// Which packages a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageTarget {
    #[default]
    Both,
    Video,
    Article,
}

impl PackageTarget {
    pub fn kinds(&self) -> Vec<PackageKind> {
        match self {
            PackageTarget::Both => vec![PackageKind::Video, PackageKind::Article],
            PackageTarget::Video => vec![PackageKind::Video],
            PackageTarget::Article => vec![PackageKind::Article],
        }
    }
}

impl std::str::FromStr for PackageTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" | "all" => Ok(PackageTarget::Both),
            "video" | "youtube" => Ok(PackageTarget::Video),
            "article" | "blog" => Ok(PackageTarget::Article),
            _ => Err(format!(
                "Unknown target: {}. Valid values: both, video, article",
                s
            )),
        }
    }
}

// =============================================================================
// Schemas
// =============================================================================

fn video_schema(options: &OptionsMap) -> ContentSchema {
    let n = options.target_item_count;
    ContentSchema::new(
        "video",
        vec![
            FieldSpec::text_list("titles", options.title_count)
                .language_checked()
                .placeholder("{topic} 핵심 가이드 {n}"),
            FieldSpec::text("description")
                .language_checked()
                .cta_target()
                .humanized()
                .guidance("3~6 sentences; sales mode may end with one call-to-action sentence")
                .placeholder("{topic} 요약 가이드입니다."),
            FieldSpec::object_list(
                "chapters",
                vec![
                    ObjectKey::new("title").placeholder("{topic} 팁 {n}"),
                    ObjectKey::new("script")
                        .hint("3~5 sentences")
                        .language_checked()
                        .humanized()
                        .placeholder("{topic} 핵심 포인트 {n}"),
                ],
                n,
            ),
            FieldSpec::object_list(
                "chapter_images",
                vec![
                    ObjectKey::new("index").hint("chapter number").placeholder("{n}"),
                    ObjectKey::new("en")
                        .hint(IMAGE_HINT)
                        .placeholder("support visual for chapter {n} about '{topic}', no text overlay"),
                ],
                n,
            ),
            FieldSpec::text_list("hashtags", options.hashtag_count)
                .guidance("#..")
                .placeholders(vec!["#{tag}", "#건강", "#관리", "#생활"]),
        ],
    )
}

fn article_schema(options: &OptionsMap) -> ContentSchema {
    let min = options.minimum_body_length;
    ContentSchema::new(
        "article",
        vec![
            FieldSpec::text_list("titles", options.title_count)
                .placeholder("{topic} 블로그 {n}"),
            FieldSpec::text("body")
                .min_length(min)
                .cta_target()
                .humanized()
                .guidance(&format!(
                    "서론→핵심5→체크리스트(6~8)→자가진단(5)→FAQ(3)→마무리, {}+자, 본문 내 {} 마커 포함",
                    min,
                    image_markers(options.image_count)
                ))
                .placeholder("{topic} 기본 안내"),
            FieldSpec::object_list(
                "images",
                vec![
                    ObjectKey::new("label").placeholders(vec!["대표", "본문{n0}"]),
                    ObjectKey::new("en")
                        .hint(IMAGE_HINT)
                        .placeholder("support visual for section {n0} of '{topic}' (no text overlay)"),
                ],
                options.image_count,
            ),
            FieldSpec::text_list("tags", options.hashtag_count)
                .guidance("#..")
                .placeholders(vec!["#{tag}", "#건강", "#식단", "#생활", "#관리"]),
        ],
    )
}

/// Image marker labels, e.g. `[이미지:대표/본문1/본문2]`
pub fn image_markers(count: usize) -> String {
    let labels: Vec<String> = (0..count.max(1))
        .map(|i| if i == 0 { "대표".to_string() } else { format!("본문{}", i) })
        .collect();
    format!("[이미지:{}]", labels.join("/"))
}

// =============================================================================
// Instructions
// =============================================================================

fn voice_rules(options: &OptionsMap) -> PromptBuilder {
    let narrator = format!(
        "화자: 20년 차 현장 전문가 '{}'. 차분+가벼운 유머. 존대.",
        options.persona
    );
    let tone = format!("톤: {} ({})", options.style.label(), options.style.directive());
    PromptBuilder::new().rules(
        "persona / voice rules",
        vec![
            narrator.as_str(),
            "리듬: 짧/긴 문장 섞고 2~3문장마다 호흡.",
            "사례 1개 이상, 비교/주의/대안 포함. 마무리 2줄 요약+체크 3~5.",
            tone.as_str(),
        ],
    )
}

fn video_system(options: &OptionsMap, mode: Mode) -> String {
    let language = options.target_language.display_name();
    let role = format!(
        "You are a seasoned {} YouTube scriptwriter. Return STRICT JSON ONLY.",
        language
    );
    let fields_language = format!(
        "'titles', 'description', and 'chapters' MUST be written in {}.",
        language.to_uppercase()
    );
    let titles = format!(
        "SEO titles ({}, {}) should include the main keyword early and avoid clickbait.",
        options.title_count, language
    );
    let chapters = format!(
        "Provide exactly {} chapters (3~5 sentences each) and exactly {} chapter_images.",
        options.target_item_count, options.target_item_count
    );

    voice_rules(options)
        .role(&role)
        .focus(
            &fields_language,
            vec![
                "Image prompts MUST be in ENGLISH ONLY and include 'no text overlay'.",
                titles.as_str(),
                chapters.as_str(),
                "All visuals in Korean context.",
                mode.cta_directive(),
            ],
        )
        .build()
}

fn article_system(options: &OptionsMap, mode: Mode) -> String {
    let language = options.target_language.display_name();
    let role = format!(
        "You are a {} SEO writer for a blog. Return STRICT JSON ONLY.",
        language
    );
    let body = format!(
        "Body MUST be >= {} {} characters and include {} markers.",
        options.minimum_body_length,
        language,
        image_markers(options.image_count)
    );
    let counts = format!(
        "Provide {} SEO titles, {} tags, and {} EN image prompts with NO TEXT OVERLAY.",
        options.title_count, options.hashtag_count, options.image_count
    );

    voice_rules(options)
        .role(&role)
        .focus(
            &body,
            vec![
                "Structure: 서론 → 핵심5 → 체크리스트(6~8) → 자가진단(5) → FAQ(3) → 마무리.",
                mode.cta_directive(),
                counts.as_str(),
            ],
        )
        .build()
}
