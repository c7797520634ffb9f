//! Content packages
//!
//! Schemas, options and the assembler that fills them from model replies,
//! plus the post-processing rules, exports and image prompt helpers used
//! around it.

pub mod assembler;
pub mod export;
pub mod image_prompt;
pub mod options;
pub mod packages;
pub mod rules;
pub mod schema;
pub mod tasks;

pub use assembler::{
    Assembly, AssemblyOutcome, AssemblyReport, AssemblyState, AssemblerContext, ContentAssembler,
    LengthCheck, schema_instructions,
};
pub use export::{PackageExporter, TagJoin, body_with_tags, join_tags, vrew_script};
pub use image_prompt::{Demographics, ImageStyle, build_image_prompt, detect_demographics, thumbnail_prompt};
pub use options::{Mode, ModeSelection, OptionsMap, Style, TargetLanguage, detect_mode};
pub use packages::{PackageKind, PackageTarget};
pub use rules::{FollowUp, apply_cta, correct_language, humanize};
pub use schema::{
    ContentSchema, FieldShape, FieldSpec, FieldValue, ObjectEntry, ObjectKey, Shortfall,
    ShortfallKind, StructuredRecord, render_placeholder,
};
pub use tasks::{JobOutput, run_bounded};
