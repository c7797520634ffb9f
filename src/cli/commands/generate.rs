//! Generate Command
//!
//! Assembles the requested packages for one topic and prints them as copy
//! blocks, or as JSON. With `--output` the package files are written too.
//!
//! Usage:
//!   contentsmith generate "무릎 관절에 좋은 습관" --target both --mode auto

use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use crate::ai::create_provider;
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::constants::tasks;
use crate::content::{
    Assembly, AssemblerContext, ContentAssembler, ImageStyle, ModeSelection, OptionsMap,
    PackageExporter, PackageKind, PackageTarget, Style, TagJoin, TargetLanguage, body_with_tags,
    join_tags, run_bounded, vrew_script,
};
use crate::types::{ContentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Valid values: text, json", s)),
        }
    }
}

/// Picture overrides; `None` keeps the topic-based default
#[derive(Debug, Clone, Default)]
pub struct ImageOverrides {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub place: Option<String>,
    pub mood: Option<String>,
    pub shot: Option<String>,
    pub style: Option<String>,
}

impl ImageOverrides {
    fn apply(&self, topic: &str) -> ImageStyle {
        let mut image = ImageStyle::for_topic(topic);
        if let Some(age) = &self.age {
            image = image.with_age(age);
        }
        if let Some(gender) = &self.gender {
            image = image.with_gender(gender);
        }
        if let Some(place) = &self.place {
            image = image.with_place(place);
        }
        if let Some(mood) = &self.mood {
            image = image.with_mood(mood);
        }
        if let Some(shot) = &self.shot {
            image = image.with_shot(shot);
        }
        if let Some(style) = &self.style {
            image = image.with_style(style);
        }
        image
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub topic: String,
    pub target: PackageTarget,
    pub mode: Option<ModeSelection>,
    pub style: Option<Style>,
    pub language: Option<TargetLanguage>,
    pub chapters: Option<usize>,
    pub min_length: Option<usize>,
    pub images: Option<usize>,
    pub cta: Option<String>,
    pub no_humanize: bool,
    pub safe_mode: bool,
    pub tags: TagJoin,
    pub image: ImageOverrides,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

impl GenerateOptions {
    /// Config defaults with command-line overrides on top
    pub fn options_map(&self, config: &Config) -> OptionsMap {
        let mut options = OptionsMap::from_config(config);
        if let Some(mode) = self.mode {
            options = options.with_mode(mode);
        }
        if let Some(style) = self.style {
            options = options.with_style(style);
        }
        if let Some(language) = &self.language {
            options = options.with_target_language(language.clone());
        }
        if let Some(chapters) = self.chapters {
            options = options.with_item_count(chapters);
        }
        if let Some(min_length) = self.min_length {
            options = options.with_minimum_body_length(min_length);
        }
        if let Some(images) = self.images {
            options = options.with_image_count(images);
        }
        if let Some(cta) = &self.cta {
            options = options.with_cta(cta.clone());
        }
        if self.no_humanize {
            options = options.with_humanize(false);
        }
        options
    }

    pub fn workers(&self) -> usize {
        if self.safe_mode { 1 } else { tasks::MAX_WORKERS }
    }
}

pub async fn run(opts: GenerateOptions) -> Result<()> {
    let topic = opts.topic.trim().to_string();
    if topic.is_empty() {
        return Err(ContentError::Config("Topic must not be empty".to_string()));
    }

    let config = ConfigLoader::load()?;
    let options = opts.options_map(&config);
    let provider = create_provider(&config.llm)?;
    let assembler = ContentAssembler::from_config(provider, &config);
    let ctx = AssemblerContext::from_config(&config);
    info!(
        session = %ctx.session_id,
        provider = assembler.client().provider_name(),
        model = assembler.model(),
        "Generating packages"
    );

    let jobs: Vec<_> = opts
        .target
        .kinds()
        .into_iter()
        .map(|kind| {
            let job = {
                let assembler = &assembler;
                let ctx = &ctx;
                let options = &options;
                let topic = topic.as_str();
                async move { (kind, assembler.assemble_package(ctx, kind, topic, options).await) }
            };
            (kind.to_string(), job)
        })
        .collect();

    let mut assemblies = Vec::new();
    for done in run_bounded(jobs, opts.workers()).await {
        let (kind, result) = done.output;
        assemblies.push((kind, result?));
    }

    let image_style = opts.image.apply(&topic);
    let exporter = PackageExporter::new();
    match opts.format {
        OutputFormat::Text => print_text(&assemblies, &topic, &image_style, opts.tags, &exporter),
        OutputFormat::Json => print_json(&assemblies, &topic, &image_style, &exporter)?,
    }

    if let Some(dir) = &opts.output {
        let output = Output::new();
        for (kind, assembly) in &assemblies {
            let path = exporter.write(*kind, assembly.record(), dir)?;
            output.success(&format!("Saved {}", path.display()));
            let sheet = exporter.image_prompts_txt(*kind, &topic, assembly.record(), &image_style);
            let path = exporter.write_file(dir, &format!("{}_image_prompts.txt", kind), &sheet)?;
            output.success(&format!("Saved {}", path.display()));
        }
    }

    if opts.format == OutputFormat::Text {
        Output::new().info(&ctx.budget.stats().summary());
    }
    Ok(())
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_text(
    assemblies: &[(PackageKind, Assembly)],
    topic: &str,
    image_style: &ImageStyle,
    tags: TagJoin,
    exporter: &PackageExporter,
) {
    let output = Output::new();

    for (kind, assembly) in assemblies {
        let record = assembly.record();
        match kind {
            PackageKind::Video => {
                output.header("📺 Video package");
                output.block("Titles", &numbered(record.list("titles").unwrap_or_default()));
                output.block("Description", record.text("description").unwrap_or_default());
                output.block("Vrew script", &vrew_script(record));
                for (i, chapter) in record.objects("chapters").unwrap_or_default().iter().enumerate() {
                    let title = chapter.get("title").map(String::as_str).unwrap_or_default();
                    let script = chapter.get("script").map(String::as_str).unwrap_or_default();
                    output.block(&format!("[챕터 {}] {}", i + 1, title), script);
                }
                output.block(
                    "Hashtags",
                    &join_tags(record.list("hashtags").unwrap_or_default(), tags),
                );
            }
            PackageKind::Article => {
                output.header("📝 Article package");
                output.block("Titles", &numbered(record.list("titles").unwrap_or_default()));
                output.block("Body", record.text("body").unwrap_or_default());
                output.block("Body + tags", &body_with_tags(record, tags));
                output.block("Tags", &join_tags(record.list("tags").unwrap_or_default(), tags));
            }
        }

        output.section("Image prompts (EN only, no text overlay)");
        println!("{}", exporter.image_prompts_txt(*kind, topic, record, image_style));

        let report = &assembly.report;
        output.section("Report");
        output.key_value("mode:", report.mode);
        output.key_value("requests:", report.remote_calls);
        output.key_value("elapsed:", format!("{:.1}s", report.elapsed.as_secs_f64()));
        output.key_value("trace:", report.trace_line());
        for check in &report.expansions {
            output.key_value(
                "length:",
                format!("{} {}/{} chars", check.field, check.after, check.required),
            );
        }
        if !report.translated.is_empty() {
            output.key_value("translated:", report.translated.join(", "));
        }
        if assembly.is_degraded() {
            output.warning("Model output unavailable; showing placeholder copy");
        } else if !report.shortfalls.is_empty() {
            output.warning(&format!("{} field(s) completed locally", report.shortfalls.len()));
        }
    }
}

fn print_json(
    assemblies: &[(PackageKind, Assembly)],
    topic: &str,
    image_style: &ImageStyle,
    exporter: &PackageExporter,
) -> Result<()> {
    let mut packages = serde_json::Map::new();
    for (kind, assembly) in assemblies {
        let report = &assembly.report;
        packages.insert(
            kind.to_string(),
            json!({
                "degraded": assembly.is_degraded(),
                "record": assembly.record(),
                "image_prompts": exporter.image_prompts_txt(*kind, topic, assembly.record(), image_style),
                "report": {
                    "mode": report.mode.as_str(),
                    "trace": report.trace.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                    "remote_calls": report.remote_calls,
                    "attempts": report.attempts,
                    "shortfalls": report.shortfalls.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                    "translated": report.translated,
                    "humanized": report.humanized,
                    "deadline_exceeded": report.deadline_exceeded,
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                },
            }),
        );
    }

    let document = json!({ "topic": topic, "packages": packages });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" Text ".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_overrides_apply_to_options() {
        let opts = GenerateOptions {
            topic: "누수 수리".into(),
            mode: Some(ModeSelection::Auto),
            chapters: Some(7),
            min_length: Some(1500),
            no_humanize: true,
            ..Default::default()
        };
        let options = opts.options_map(&Config::default());

        assert_eq!(options.target_item_count, 7);
        assert_eq!(options.minimum_body_length, 1500);
        assert!(!options.humanize);
        assert!(options.resolve_mode("누수 수리").is_promotional());
    }

    #[test]
    fn test_safe_mode_uses_one_worker() {
        let opts = GenerateOptions {
            safe_mode: true,
            ..Default::default()
        };
        assert_eq!(opts.workers(), 1);
        assert_eq!(GenerateOptions::default().workers(), tasks::MAX_WORKERS);
    }

    #[test]
    fn test_image_overrides() {
        let overrides = ImageOverrides {
            age: Some("자동".into()),
            gender: Some("여성".into()),
            mood: Some("밝은".into()),
            ..Default::default()
        };
        let image = overrides.apply("50대 건강");
        assert_eq!(image.demographics.age_group, "50대");
        assert_eq!(image.demographics.gender, "여성");
        assert_eq!(image.mood, "밝은");
    }
}
