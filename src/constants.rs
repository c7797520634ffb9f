//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry policy constants
pub mod retry {
    /// Attempts per model before moving to the fallback model
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Backoff schedule between attempts (milliseconds).
    /// Attempts past the end of the schedule reuse the last entry.
    pub const BACKOFF_SCHEDULE_MS: [u64; 3] = [700, 1200, 2000];

    /// Jitter as a fraction of the scheduled delay
    pub const JITTER_FRACTION: f64 = 0.25;
}

/// HTTP/Network constants
pub mod network {
    /// Per-attempt request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Cap on generated tokens per request
    pub const DEFAULT_MAX_TOKENS: u32 = 2200;

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.6;

    /// Temperature used for translation follow-ups
    pub const TRANSLATE_TEMPERATURE: f32 = 0.2;

    /// Temperature used for expansion follow-ups
    pub const EXPAND_TEMPERATURE: f32 = 0.5;

    /// Temperature used for the humanizing pass
    pub const HUMANIZE_TEMPERATURE: f32 = 0.6;
}

/// Soft usage budget for the optional humanizing pass
pub mod budget {
    /// Maximum humanize calls per session
    pub const HUMANIZE_MAX_CALLS: u32 = 8;

    /// Maximum cumulative humanize seconds per session
    pub const HUMANIZE_MAX_SECS: f64 = 20.0;
}

/// Language consistency constants
pub mod language {
    /// ASCII letters over all letters above which a field counts as
    /// "mostly foreign" for a non-Latin target language
    pub const ASCII_RATIO_THRESHOLD: f64 = 0.4;

    /// Number of list entries sampled for the language check
    pub const LIST_SAMPLE_SIZE: usize = 3;

    /// Default target language code
    pub const DEFAULT_TARGET: &str = "ko";
}

/// Content package constants
pub mod content {
    /// SEO titles per package
    pub const TITLE_COUNT: usize = 10;

    /// Default chapter count for video packages
    pub const CHAPTER_COUNT: usize = 5;

    /// Hashtags / tags per package
    pub const HASHTAG_COUNT: usize = 20;

    /// Default image prompt count for article packages
    pub const IMAGE_COUNT: usize = 5;

    /// Default minimum article body length (characters)
    pub const MINIMUM_BODY_LENGTH: usize = 2200;

    /// Extra characters requested on top of the minimum when expanding
    pub const EXPANSION_MARGIN: usize = 300;

    /// Deadline for a whole `assemble` call (seconds)
    pub const OVERALL_DEADLINE_SECS: u64 = 90;

    /// Deadline for one expansion follow-up (seconds)
    pub const EXPANSION_DEADLINE_SECS: u64 = 35;

    /// Default call-to-action line
    pub const DEFAULT_CTA: &str = "상담이 필요하시면 지금 바로 문의주세요.";

    /// Default narrator persona
    pub const DEFAULT_PERSONA: &str = "강쌤";

    /// Default regional context for the humanizing pass
    pub const DEFAULT_REGION: &str = "관악구";

    /// Topic keywords that switch auto mode to promotional
    pub const PROMO_KEYWORDS: [&str; 8] = [
        "시공", "교체", "설치", "수리", "누수", "보수", "후기", "현장",
    ];
}

/// Task helper constants
pub mod tasks {
    /// Concurrent package workers
    pub const MAX_WORKERS: usize = 2;
}
