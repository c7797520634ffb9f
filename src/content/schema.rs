//! Content schemas and structured records
//!
//! A [`ContentSchema`] names the fields a package must contain and their
//! shapes. A [`StructuredRecord`] is what a model reply turns into once the
//! schema is applied; [`StructuredRecord::normalize`] then forces it to
//! satisfy every count and presence constraint using placeholder templates.
//!
//! Placeholder templates understand four variables: `{topic}`, `{tag}`
//! (topic without whitespace), `{n}` (1-based position) and `{n0}` (0-based).

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{ContentError, Result, json_string, json_string_array};

// =============================================================================
// Schema
// =============================================================================

/// One string key inside an object-valued field
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectKey {
    pub name: String,
    /// Hint shown in the schema skeleton
    pub hint: String,
    /// Template for position `n` is `placeholders[n - 1]`; the last one repeats
    pub placeholders: Vec<String>,
    pub language_checked: bool,
    pub humanize: bool,
}

impl ObjectKey {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hint: "...".to_string(),
            placeholders: vec!["{topic} {n}".to_string()],
            language_checked: false,
            humanize: false,
        }
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.hint = hint.to_string();
        self
    }

    pub fn placeholder(mut self, template: &str) -> Self {
        self.placeholders = vec![template.to_string()];
        self
    }

    pub fn placeholders(mut self, templates: Vec<&str>) -> Self {
        self.placeholders = templates.into_iter().map(String::from).collect();
        self
    }

    pub fn language_checked(mut self) -> Self {
        self.language_checked = true;
        self
    }

    pub fn humanized(mut self) -> Self {
        self.humanize = true;
        self
    }

    fn synthesize(&self, topic: &str, n: usize) -> String {
        let idx = (n.max(1) - 1).min(self.placeholders.len().saturating_sub(1));
        let template = self.placeholders.get(idx).map(String::as_str).unwrap_or("{topic} {n}");
        render_placeholder(template, topic, n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Text,
    TextList,
    ObjectList(Vec<ObjectKey>),
    Object(Vec<ObjectKey>),
}

impl FieldShape {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::TextList | Self::ObjectList(_))
    }

    pub fn keys(&self) -> &[ObjectKey] {
        match self {
            Self::ObjectList(keys) | Self::Object(keys) => keys,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub shape: FieldShape,
    pub required: bool,
    /// Exact entry count for list shapes
    pub target_count: Option<usize>,
    /// Minimum characters for text shapes
    pub min_length: Option<usize>,
    pub language_checked: bool,
    /// Receives (or loses) the call-to-action line
    pub cta_target: bool,
    pub humanize: bool,
    /// Description embedded in the schema skeleton
    pub guidance: String,
    /// Templates cycled by position when synthesizing entries
    pub placeholders: Vec<String>,
}

impl FieldSpec {
    fn with_shape(name: &str, shape: FieldShape, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            shape,
            required: true,
            target_count: None,
            min_length: None,
            language_checked: false,
            cta_target: false,
            humanize: false,
            guidance: "...".to_string(),
            placeholders: vec![placeholder.to_string()],
        }
    }

    pub fn text(name: &str) -> Self {
        Self::with_shape(name, FieldShape::Text, "{topic}")
    }

    pub fn text_list(name: &str, count: usize) -> Self {
        Self {
            target_count: Some(count),
            ..Self::with_shape(name, FieldShape::TextList, "{topic} {n}")
        }
    }

    pub fn object_list(name: &str, keys: Vec<ObjectKey>, count: usize) -> Self {
        Self {
            target_count: Some(count),
            ..Self::with_shape(name, FieldShape::ObjectList(keys), "")
        }
    }

    pub fn object(name: &str, keys: Vec<ObjectKey>) -> Self {
        Self::with_shape(name, FieldShape::Object(keys), "")
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_length(mut self, chars: usize) -> Self {
        self.min_length = Some(chars);
        self
    }

    pub fn language_checked(mut self) -> Self {
        self.language_checked = true;
        self
    }

    pub fn cta_target(mut self) -> Self {
        self.cta_target = true;
        self
    }

    pub fn humanized(mut self) -> Self {
        self.humanize = true;
        self
    }

    pub fn guidance(mut self, text: &str) -> Self {
        self.guidance = text.to_string();
        self
    }

    pub fn placeholder(mut self, template: &str) -> Self {
        self.placeholders = vec![template.to_string()];
        self
    }

    pub fn placeholders(mut self, templates: Vec<&str>) -> Self {
        self.placeholders = templates.into_iter().map(String::from).collect();
        self
    }

    /// Placeholder text for 1-based position `n`
    fn synthesize(&self, topic: &str, n: usize) -> String {
        let idx = (n.max(1) - 1) % self.placeholders.len().max(1);
        let template = self.placeholders.get(idx).map(String::as_str).unwrap_or("{topic}");
        render_placeholder(template, topic, n)
    }
}

/// Named set of fields a package must contain
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ContentSchema {
    pub fn new(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(ContentError::Schema(format!("schema '{}' has no fields", self.name)));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ContentError::Schema("field name must not be blank".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ContentError::Schema(format!("duplicate field '{}'", field.name)));
            }
            if field.target_count.is_some() && !field.shape.is_list() {
                return Err(ContentError::Schema(format!(
                    "field '{}': target count requires a list shape",
                    field.name
                )));
            }
            if field.target_count == Some(0) {
                return Err(ContentError::Schema(format!(
                    "field '{}': target count must be at least 1",
                    field.name
                )));
            }
            if field.min_length.is_some() && field.shape != FieldShape::Text {
                return Err(ContentError::Schema(format!(
                    "field '{}': minimum length requires a text shape",
                    field.name
                )));
            }
            if field.cta_target && field.shape != FieldShape::Text {
                return Err(ContentError::Schema(format!(
                    "field '{}': call-to-action target must be text",
                    field.name
                )));
            }
            match &field.shape {
                FieldShape::ObjectList(keys) | FieldShape::Object(keys) => {
                    if keys.is_empty() {
                        return Err(ContentError::Schema(format!(
                            "field '{}': object shape needs at least one key",
                            field.name
                        )));
                    }
                    let mut key_names = HashSet::new();
                    for key in keys {
                        if !key_names.insert(key.name.as_str()) {
                            return Err(ContentError::Schema(format!(
                                "field '{}': duplicate key '{}'",
                                field.name, key.name
                            )));
                        }
                        if key.placeholders.iter().all(|p| p.trim().is_empty()) {
                            return Err(ContentError::Schema(format!(
                                "field '{}': key '{}' has no placeholder",
                                field.name, key.name
                            )));
                        }
                    }
                }
                FieldShape::Text | FieldShape::TextList => {
                    if field.placeholders.iter().all(|p| p.trim().is_empty()) {
                        return Err(ContentError::Schema(format!(
                            "field '{}' has no placeholder",
                            field.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// JSON shape description embedded in instructions
    pub fn skeleton(&self) -> String {
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                let value = match &field.shape {
                    FieldShape::Text => quote(&field.guidance),
                    FieldShape::TextList => {
                        let count = field.target_count.unwrap_or(1);
                        format!("[{}]", vec![quote(&field.guidance); count].join(","))
                    }
                    FieldShape::ObjectList(keys) => {
                        let count = field.target_count.unwrap_or(1);
                        format!("[{}]", vec![object_skeleton(keys); count].join(","))
                    }
                    FieldShape::Object(keys) => object_skeleton(keys),
                };
                format!("  {}: {}", quote(&field.name), value)
            })
            .collect();
        format!("{{\n{}\n}}", lines.join(",\n"))
    }

    /// Record built purely from placeholders
    pub fn synthesize(&self, topic: &str) -> StructuredRecord {
        let mut record = StructuredRecord::default();
        record.normalize(self, topic);
        record
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn object_skeleton(keys: &[ObjectKey]) -> String {
    let pairs: Vec<String> = keys
        .iter()
        .map(|k| format!("{}:{}", quote(&k.name), quote(&k.hint)))
        .collect();
    format!("{{{}}}", pairs.join(","))
}

pub fn render_placeholder(template: &str, topic: &str, n: usize) -> String {
    let tag: String = topic.split_whitespace().collect();
    template
        .replace("{topic}", topic.trim())
        .replace("{tag}", &tag)
        .replace("{n0}", &n.saturating_sub(1).to_string())
        .replace("{n}", &n.to_string())
}

// =============================================================================
// Structured Record
// =============================================================================

pub type ObjectEntry = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Objects(Vec<ObjectEntry>),
    Object(ObjectEntry),
}

/// Field name → parsed value, restricted to schema fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallKind {
    /// Required field absent; synthesized from placeholders
    Missing,
    /// Text field was blank
    Blank,
    /// List padded with this many placeholder entries
    Padded(usize),
    /// List truncated by this many entries
    Truncated(usize),
    /// Object keys filled from placeholders
    BlankKeys(usize),
}

/// A constraint the model did not meet, resolved locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub field: String,
    pub kind: ShortfallKind,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ShortfallKind::Missing => write!(f, "{}: missing", self.field),
            ShortfallKind::Blank => write!(f, "{}: blank", self.field),
            ShortfallKind::Padded(n) => write!(f, "{}: padded {}", self.field, n),
            ShortfallKind::Truncated(n) => write!(f, "{}: truncated {}", self.field, n),
            ShortfallKind::BlankKeys(n) => write!(f, "{}: filled {} keys", self.field, n),
        }
    }
}

impl StructuredRecord {
    /// Apply `schema` to a parsed object, keeping only known fields whose
    /// values can be coerced to the declared shape.
    ///
    /// Replies that wrap everything in one envelope object (`{"blog": {...}}`)
    /// are unwrapped first.
    pub fn from_value(schema: &ContentSchema, object: &Map<String, Value>) -> Self {
        let source = locate_fields(schema, object);
        let container = Value::Object(source.clone());
        let mut fields = BTreeMap::new();

        for spec in &schema.fields {
            let Some(raw) = source.get(&spec.name) else {
                continue;
            };
            let value = match &spec.shape {
                FieldShape::Text => coerce_text(raw).map(FieldValue::Text),
                FieldShape::TextList => coerce_list(&container, &spec.name, raw).map(FieldValue::List),
                FieldShape::ObjectList(keys) => raw.as_array().map(|items| {
                    FieldValue::Objects(
                        items
                            .iter()
                            .filter(|item| item.is_object())
                            .map(|item| coerce_object(item, keys))
                            .collect(),
                    )
                }),
                FieldShape::Object(keys) => raw
                    .is_object()
                    .then(|| FieldValue::Object(coerce_object(raw, keys))),
            };
            if let Some(value) = value {
                fields.insert(spec.name.clone(), value);
            }
        }

        Self { fields }
    }

    /// Force the record to satisfy presence and count constraints.
    ///
    /// Idempotent: a second call returns no shortfalls and changes nothing.
    pub fn normalize(&mut self, schema: &ContentSchema, topic: &str) -> Vec<Shortfall> {
        let mut shortfalls = Vec::new();
        let known: HashSet<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        self.fields.retain(|name, _| known.contains(name.as_str()));

        for spec in &schema.fields {
            let mut note = |kind| {
                shortfalls.push(Shortfall {
                    field: spec.name.clone(),
                    kind,
                })
            };

            if !self.fields.contains_key(&spec.name) {
                if !spec.required {
                    continue;
                }
                note(ShortfallKind::Missing);
                let empty = match &spec.shape {
                    FieldShape::Text => FieldValue::Text(spec.synthesize(topic, 1)),
                    FieldShape::TextList => FieldValue::List(Vec::new()),
                    FieldShape::ObjectList(_) => FieldValue::Objects(Vec::new()),
                    FieldShape::Object(_) => FieldValue::Object(ObjectEntry::new()),
                };
                self.fields.insert(spec.name.clone(), empty);
            }

            let Some(value) = self.fields.get_mut(&spec.name) else {
                continue;
            };

            match (&spec.shape, value) {
                (FieldShape::Text, FieldValue::Text(text)) => {
                    if text.trim().is_empty() {
                        note(ShortfallKind::Blank);
                        *text = spec.synthesize(topic, 1);
                    }
                }
                (FieldShape::TextList, FieldValue::List(items)) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        if item.trim().is_empty() {
                            *item = spec.synthesize(topic, i + 1);
                        }
                    }
                    if let Some(target) = spec.target_count {
                        if items.len() > target {
                            note(ShortfallKind::Truncated(items.len() - target));
                            items.truncate(target);
                        } else if items.len() < target {
                            note(ShortfallKind::Padded(target - items.len()));
                            for n in items.len() + 1..=target {
                                items.push(spec.synthesize(topic, n));
                            }
                        }
                    }
                }
                (FieldShape::ObjectList(keys), FieldValue::Objects(entries)) => {
                    if let Some(target) = spec.target_count {
                        if entries.len() > target {
                            note(ShortfallKind::Truncated(entries.len() - target));
                            entries.truncate(target);
                        } else if entries.len() < target {
                            note(ShortfallKind::Padded(target - entries.len()));
                            entries.resize_with(target, ObjectEntry::new);
                        }
                    }
                    let mut filled = 0;
                    for (i, entry) in entries.iter_mut().enumerate() {
                        filled += fill_object(entry, keys, topic, i + 1);
                    }
                    if filled > 0 {
                        note(ShortfallKind::BlankKeys(filled));
                    }
                }
                (FieldShape::Object(keys), FieldValue::Object(entry)) => {
                    let filled = fill_object(entry, keys, topic, 1);
                    if filled > 0 {
                        note(ShortfallKind::BlankKeys(filled));
                    }
                }
                // from_value never produces a mismatched shape
                _ => {}
            }
        }

        shortfalls
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name)? {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn objects(&self, name: &str) -> Option<&[ObjectEntry]> {
        match self.fields.get(name)? {
            FieldValue::Objects(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectEntry> {
        match self.fields.get(name)? {
            FieldValue::Object(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn locate_fields<'a>(schema: &ContentSchema, object: &'a Map<String, Value>) -> &'a Map<String, Value> {
    let has_fields = |map: &Map<String, Value>| schema.fields.iter().any(|f| map.contains_key(&f.name));
    if has_fields(object) {
        return object;
    }
    object
        .values()
        .filter_map(Value::as_object)
        .find(|nested| has_fields(*nested))
        .unwrap_or(object)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        other => scalar_text(other),
    }
}

fn coerce_list(container: &Value, name: &str, value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let mut list = json_string_array(container, name);
            if list.is_empty() {
                // numbers and other scalars
                list = items
                    .iter()
                    .filter_map(scalar_text)
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            Some(list)
        }
        Value::String(text) => Some(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        ),
        _ => None,
    }
}

fn coerce_object(value: &Value, keys: &[ObjectKey]) -> ObjectEntry {
    keys.iter()
        .filter_map(|key| {
            let text = json_string(value, &key.name)
                .or_else(|| value.get(&key.name).and_then(scalar_text))?;
            Some((key.name.clone(), text))
        })
        .collect()
}

/// Fill blank or absent keys; returns how many were filled
fn fill_object(entry: &mut ObjectEntry, keys: &[ObjectKey], topic: &str, n: usize) -> usize {
    entry.retain(|name, _| keys.iter().any(|k| &k.name == name));
    let mut filled = 0;
    for key in keys {
        let blank = entry.get(&key.name).is_none_or(|v| v.trim().is_empty());
        if blank {
            entry.insert(key.name.clone(), key.synthesize(topic, n));
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema() -> ContentSchema {
        ContentSchema::new(
            "test",
            vec![
                FieldSpec::text_list("titles", 10).placeholder("{topic} 가이드 {n}"),
                FieldSpec::text("body").placeholder("{topic} 기본 안내").min_length(100),
                FieldSpec::object_list(
                    "chapters",
                    vec![
                        ObjectKey::new("title").placeholder("챕터 {n}"),
                        ObjectKey::new("script").placeholder("{topic} 핵심 포인트 {n}"),
                    ],
                    5,
                ),
                FieldSpec::object(
                    "demographics",
                    vec![ObjectKey::new("age_group").placeholder("성인")],
                )
                .optional(),
            ],
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validate_accepts_good_schema() {
        assert!(schema().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_schemas() {
        let empty = ContentSchema::new("x", vec![]);
        assert!(matches!(empty.validate(), Err(ContentError::Schema(_))));

        let duplicate = ContentSchema::new("x", vec![FieldSpec::text("a"), FieldSpec::text("a")]);
        assert!(duplicate.validate().is_err());

        let mut counted_text = FieldSpec::text("a");
        counted_text.target_count = Some(3);
        assert!(ContentSchema::new("x", vec![counted_text]).validate().is_err());

        let zero = FieldSpec::text_list("a", 0);
        assert!(ContentSchema::new("x", vec![zero]).validate().is_err());

        let keyless = FieldSpec::object_list("a", vec![], 2);
        assert!(ContentSchema::new("x", vec![keyless]).validate().is_err());

        let cta_list = FieldSpec::text_list("a", 2).cta_target();
        assert!(ContentSchema::new("x", vec![cta_list]).validate().is_err());
    }

    #[test]
    fn test_skeleton_lists_every_field() {
        let skeleton = schema().skeleton();
        assert!(skeleton.contains("\"titles\": [\"...\""));
        assert_eq!(skeleton.matches("{\"title\":\"...\",\"script\":\"...\"}").count(), 5);
        assert!(skeleton.contains("\"demographics\": {\"age_group\":\"...\"}"));
        assert!(skeleton.starts_with('{') && skeleton.ends_with('}'));
    }

    #[test]
    fn test_from_value_coerces_shapes() {
        let value = object(json!({
            "titles": ["  a ", "", 3],
            "body": ["line one", "line two"],
            "chapters": [{"title": "t1", "script": "s1", "extra": "x"}, "stray"],
            "unknown": "dropped"
        }));
        let record = StructuredRecord::from_value(&schema(), &value);

        assert_eq!(record.list("titles").unwrap(), &["a".to_string()]);
        assert_eq!(record.text("body"), Some("line one\nline two"));
        let chapters = record.objects("chapters").unwrap();
        assert_eq!(chapters.len(), 1);
        assert!(!chapters[0].contains_key("extra"));
        assert!(record.get("unknown").is_none());
    }

    #[test]
    fn test_numeric_list_entries() {
        let value = object(json!({"titles": [1, 2]}));
        let record = StructuredRecord::from_value(&schema(), &value);
        assert_eq!(record.list("titles").unwrap(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_from_value_unwraps_envelope() {
        let value = object(json!({"blog": {"body": "inside"}}));
        let record = StructuredRecord::from_value(&schema(), &value);
        assert_eq!(record.text("body"), Some("inside"));
    }

    #[test]
    fn test_newline_text_becomes_list() {
        let value = object(json!({"titles": "one\n\ntwo\n"}));
        let record = StructuredRecord::from_value(&schema(), &value);
        assert_eq!(record.list("titles").unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_pads_and_truncates() {
        let titles: Vec<String> = (0..15).map(|i| format!("title {i}")).collect();
        let value = object(json!({
            "titles": titles,
            "body": "body",
            "chapters": [{"title": "only", "script": ""}]
        }));
        let mut record = StructuredRecord::from_value(&schema(), &value);
        let shortfalls = record.normalize(&schema(), "무릎");

        assert_eq!(record.list("titles").unwrap().len(), 10);
        let chapters = record.objects("chapters").unwrap();
        assert_eq!(chapters.len(), 5);
        assert_eq!(chapters[0]["title"], "only");
        assert_eq!(chapters[0]["script"], "무릎 핵심 포인트 1");
        assert_eq!(chapters[4]["title"], "챕터 5");

        assert!(shortfalls.contains(&Shortfall {
            field: "titles".into(),
            kind: ShortfallKind::Truncated(5)
        }));
        assert!(shortfalls.contains(&Shortfall {
            field: "chapters".into(),
            kind: ShortfallKind::Padded(4)
        }));
        // optional object stays absent
        assert!(record.object("demographics").is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let value = object(json!({"titles": ["a"], "chapters": []}));
        let mut record = StructuredRecord::from_value(&schema(), &value);
        record.normalize(&schema(), "주제");
        let once = record.clone();

        let again = record.normalize(&schema(), "주제");
        assert!(again.is_empty());
        assert_eq!(record, once);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut record = schema().synthesize("주제");
        record.normalize(&schema(), "주제");
        let object = record.to_json().as_object().cloned().unwrap();
        let mut reparsed = StructuredRecord::from_value(&schema(), &object);

        assert!(reparsed.normalize(&schema(), "주제").is_empty());
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_synthesize_interpolates_topic() {
        let record = schema().synthesize("허리 통증");
        assert!(record.list("titles").unwrap().iter().all(|t| t.contains("허리 통증")));
        assert_eq!(record.text("body"), Some("허리 통증 기본 안내"));
        assert_eq!(record.objects("chapters").unwrap().len(), 5);
    }

    #[test]
    fn test_placeholder_cycle_and_tag() {
        let spec = FieldSpec::text_list("tags", 4).placeholders(vec!["#{tag}", "#건강"]);
        assert_eq!(spec.synthesize("허리 통증", 1), "#허리통증");
        assert_eq!(spec.synthesize("허리 통증", 2), "#건강");
        assert_eq!(spec.synthesize("허리 통증", 3), "#허리통증");
    }

    #[test]
    fn test_object_key_placeholders_repeat_last() {
        let key = ObjectKey::new("label").placeholders(vec!["대표", "본문{n0}"]);
        assert_eq!(key.synthesize("t", 1), "대표");
        assert_eq!(key.synthesize("t", 2), "본문1");
        assert_eq!(key.synthesize("t", 4), "본문3");
    }

    proptest! {
        #[test]
        fn prop_list_always_has_target_count(len in 0usize..40, target in 1usize..15) {
            let schema = ContentSchema::new("p", vec![FieldSpec::text_list("items", target)]);
            let items: Vec<String> = (0..len).map(|i| format!("item {i}")).collect();
            let value = object(json!({ "items": items }));
            let mut record = StructuredRecord::from_value(&schema, &value);
            record.normalize(&schema, "topic");
            prop_assert_eq!(record.list("items").unwrap().len(), target);
        }

        #[test]
        fn prop_object_list_always_has_target_count(len in 0usize..20, target in 1usize..10) {
            let schema = ContentSchema::new(
                "p",
                vec![FieldSpec::object_list("rows", vec![ObjectKey::new("en")], target)],
            );
            let rows: Vec<Value> = (0..len).map(|i| json!({"en": format!("row {i}")})).collect();
            let value = object(json!({ "rows": rows }));
            let mut record = StructuredRecord::from_value(&schema, &value);
            record.normalize(&schema, "topic");
            let entries = record.objects("rows").unwrap();
            prop_assert_eq!(entries.len(), target);
            prop_assert!(entries.iter().all(|e| !e["en"].is_empty()));
        }
    }
}
