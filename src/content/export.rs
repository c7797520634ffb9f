//! Package exports
//!
//! Renders assembled records into the `.txt` / `.md` files users copy from,
//! plus the Vrew subtitle script and the image prompt sheet.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use super::image_prompt::{ImageStyle, build_image_prompt, thumbnail_prompt};
use super::packages::PackageKind;
use super::schema::StructuredRecord;
use crate::types::{ContentError, Result};

/// How tags are joined when copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagJoin {
    /// One line, separated by spaces
    #[default]
    Space,
    /// One tag per line
    Newline,
}

impl std::str::FromStr for TagJoin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "space" | "line" | "한 줄" => Ok(TagJoin::Space),
            "newline" | "lines" | "줄바꿈" => Ok(TagJoin::Newline),
            _ => Err(format!("Unknown tag join: {}. Valid values: space, newline", s)),
        }
    }
}

impl std::fmt::Display for TagJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagJoin::Space => write!(f, "space"),
            TagJoin::Newline => write!(f, "newline"),
        }
    }
}

pub fn join_tags(tags: &[String], join: TagJoin) -> String {
    let separator = match join {
        TagJoin::Space => " ",
        TagJoin::Newline => "\n",
    };
    tags.join(separator)
}

/// Article body followed by its tags, ready to paste
pub fn body_with_tags(record: &StructuredRecord, join: TagJoin) -> String {
    let body = record.text("body").unwrap_or_default().trim_end();
    let tags = join_tags(record.list("tags").unwrap_or_default(), join);
    if tags.is_empty() {
        return body.to_string();
    }
    format!("{}\n\n{}", body, tags).trim().to_string()
}

/// Every chapter script on its own line
pub fn vrew_script(record: &StructuredRecord) -> String {
    record
        .objects("chapters")
        .unwrap_or_default()
        .iter()
        .map(|chapter| {
            chapter
                .get("script")
                .map(|s| s.replace('\n', " "))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders and writes package files
#[derive(Debug, Clone)]
pub struct PackageExporter {
    generated_at: DateTime<Local>,
}

impl Default for PackageExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageExporter {
    pub fn new() -> Self {
        Self {
            generated_at: Local::now(),
        }
    }

    pub fn at(generated_at: DateTime<Local>) -> Self {
        Self { generated_at }
    }

    fn footer(&self) -> String {
        format!(
            "---\nGenerated by contentsmith v{} at {}\n",
            env!("CARGO_PKG_VERSION"),
            self.generated_at.format("%Y-%m-%d %H:%M")
        )
    }

    pub fn video_package_txt(&self, record: &StructuredRecord) -> String {
        let mut output = String::from("# YouTube Package\n\n");

        output.push_str("## Titles\n");
        output.push_str(&numbered(record.list("titles").unwrap_or_default()));
        output.push_str("\n\n## Description\n");
        output.push_str(record.text("description").unwrap_or_default().trim());

        output.push_str("\n\n## Chapters\n");
        let chapters: Vec<String> = record
            .objects("chapters")
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, chapter)| {
                format!(
                    "[챕터 {}] {}\n{}",
                    i + 1,
                    chapter.get("title").map(String::as_str).unwrap_or_default(),
                    chapter.get("script").map(String::as_str).unwrap_or_default()
                )
            })
            .collect();
        output.push_str(&chapters.join("\n\n"));

        output.push_str("\n\n## Hashtags\n");
        output.push_str(&join_tags(record.list("hashtags").unwrap_or_default(), TagJoin::Space));
        output.push_str("\n\n");
        output.push_str(&self.footer());
        output
    }

    pub fn article_package_md(&self, record: &StructuredRecord) -> String {
        let mut output = String::from("# Blog Package\n\n");

        output.push_str("## Titles\n");
        output.push_str(&numbered(record.list("titles").unwrap_or_default()));
        output.push_str("\n\n## Body\n");
        output.push_str(record.text("body").unwrap_or_default());
        output.push_str("\n\n## Tags\n");
        output.push_str(&join_tags(record.list("tags").unwrap_or_default(), TagJoin::Space));
        output.push_str("\n\n");
        output.push_str(&self.footer());
        output
    }

    /// English image prompts, one labelled block per picture.
    ///
    /// Video sheets start with a locally built thumbnail prompt.
    pub fn image_prompts_txt(
        &self,
        kind: PackageKind,
        topic: &str,
        record: &StructuredRecord,
        style: &ImageStyle,
    ) -> String {
        let mut blocks = Vec::new();

        match kind {
            PackageKind::Video => {
                blocks.push(format!("[썸네일] EN\n{}", thumbnail_prompt(topic, style)));
                let chapters = record.objects("chapters").unwrap_or_default();
                for (i, image) in record.objects("chapter_images").unwrap_or_default().iter().enumerate() {
                    let subject = match image.get("en").filter(|en| !en.trim().is_empty()) {
                        Some(en) => en.clone(),
                        None => format!(
                            "support visual for chapter {} about '{}'",
                            i + 1,
                            chapters.get(i).and_then(|c| c.get("title")).map(String::as_str).unwrap_or(topic)
                        ),
                    };
                    blocks.push(format!("[챕터 {}] EN\n{}", i + 1, build_image_prompt(&subject, style)));
                }
            }
            PackageKind::Article => {
                for image in record.objects("images").unwrap_or_default() {
                    let label = image.get("label").map(String::as_str).unwrap_or("이미지");
                    let subject = match image.get("en").filter(|en| !en.trim().is_empty()) {
                        Some(en) => en.clone(),
                        None => format!("support visual for section '{}'", label),
                    };
                    blocks.push(format!("[{}] EN\n{}", label, build_image_prompt(&subject, style)));
                }
            }
        }

        let mut output = blocks.join("\n\n");
        output.push('\n');
        output
    }

    pub fn render(&self, kind: PackageKind, record: &StructuredRecord) -> String {
        match kind {
            PackageKind::Video => self.video_package_txt(record),
            PackageKind::Article => self.article_package_md(record),
        }
    }

    /// Write the package file into `output_dir`, creating it if needed
    pub fn write(
        &self,
        kind: PackageKind,
        record: &StructuredRecord,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        self.write_file(output_dir, kind.file_name(), &self.render(kind, record))
    }

    pub fn write_file(&self, output_dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
        if output_dir.is_file() {
            return Err(ContentError::Config(format!(
                "Output path is a file: {}",
                output_dir.display()
            )));
        }
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(file_name);
        std::fs::write(&path, content)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::options::OptionsMap;
    use crate::content::schema::FieldValue;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn exporter() -> PackageExporter {
        PackageExporter::at(Local.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
    }

    fn video_record() -> StructuredRecord {
        let options = OptionsMap::default().with_item_count(2);
        let mut record = PackageKind::Video.schema(&options).synthesize("무릎 건강");
        let mut chapters = record.objects("chapters").unwrap().to_vec();
        chapters[0].insert("script".into(), "첫 줄\n둘째 줄".into());
        record.set("chapters", FieldValue::Objects(chapters));
        record
    }

    #[test]
    fn test_join_tags() {
        let tags = vec!["#a".to_string(), "#b".to_string()];
        assert_eq!(join_tags(&tags, TagJoin::Space), "#a #b");
        assert_eq!(join_tags(&tags, TagJoin::Newline), "#a\n#b");
        assert_eq!(join_tags(&[], TagJoin::Space), "");
    }

    #[test]
    fn test_tag_join_from_str() {
        assert_eq!("newline".parse::<TagJoin>().unwrap(), TagJoin::Newline);
        assert_eq!("SPACE".parse::<TagJoin>().unwrap(), TagJoin::Space);
        assert!("comma".parse::<TagJoin>().is_err());
    }

    #[test]
    fn test_body_with_tags() {
        let mut record = StructuredRecord::default();
        record.set("body", FieldValue::Text("본문\n".into()));
        assert_eq!(body_with_tags(&record, TagJoin::Space), "본문");

        record.set("tags", FieldValue::List(vec!["#a".into(), "#b".into()]));
        assert_eq!(body_with_tags(&record, TagJoin::Newline), "본문\n\n#a\n#b");
    }

    #[test]
    fn test_vrew_script_one_line_per_chapter() {
        let script = vrew_script(&video_record());
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "첫 줄 둘째 줄");
    }

    #[test]
    fn test_video_package_layout() {
        let text = exporter().video_package_txt(&video_record());
        assert!(text.starts_with("# YouTube Package\n\n## Titles\n1. 무릎 건강 핵심 가이드 1\n"));
        assert!(text.contains("## Description\n무릎 건강 요약 가이드입니다."));
        assert!(text.contains("[챕터 2] 무릎 건강 팁 2\n"));
        assert!(text.contains("## Hashtags\n#무릎건강 #건강"));
        assert!(text.contains("at 2025-03-01 09:30"));
    }

    #[test]
    fn test_article_package_layout() {
        let record = PackageKind::Article
            .schema(&OptionsMap::default())
            .synthesize("식단");
        let text = exporter().article_package_md(&record);
        assert!(text.starts_with("# Blog Package\n\n## Titles\n1. 식단 블로그 1"));
        assert!(text.contains("## Body\n식단 기본 안내"));
        assert!(text.contains("## Tags\n#식단 #건강"));
    }

    #[test]
    fn test_image_prompts_sheet() {
        let style = ImageStyle::for_topic("무릎 건강");
        let sheet = exporter().image_prompts_txt(PackageKind::Video, "무릎 건강", &video_record(), &style);
        assert!(sheet.starts_with("[썸네일] EN\n"));
        assert!(sheet.contains("[챕터 2] EN\n"));
        assert_eq!(sheet.matches("no watermarks").count(), 3);
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/out");
        let path = exporter()
            .write(PackageKind::Video, &video_record(), &out)
            .unwrap();

        assert_eq!(path, out.join("youtube_package.txt"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("# YouTube Package"));
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        let err = exporter()
            .write(PackageKind::Article, &StructuredRecord::default(), &file)
            .unwrap_err();
        assert!(matches!(err, ContentError::Config(_)));
    }
}
