//! Post-processing rules
//!
//! Applied in this order after a record is parsed and normalized:
//!
//! 1. [`correct_language`]: re-translate fields that are mostly in the wrong script
//! 2. [`apply_cta`]: exactly one call-to-action in promotional mode, none otherwise
//! 3. [`humanize`]: optional polish, bounded by the session's [`SoftBudget`]
//! 4. [`apply_cta`] again, since polishing may drop or repeat the line
//!
//! Every rule is idempotent on its own output. CTA removal is plain
//! substring removal, so a CTA string that also occurs as ordinary content
//! is removed as well.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::options::{Mode, OptionsMap};
use super::schema::{ContentSchema, FieldShape, FieldValue, StructuredRecord};
use crate::ai::budget::SoftBudget;
use crate::ai::validation::{is_mostly_foreign, list_is_mostly_foreign};
use crate::ai::{CompletionRequest, ResponseFormat, StructuredCompletionClient};
use crate::constants::{language as language_constants, network};

// =============================================================================
// Follow-up requests
// =============================================================================

/// Builds and sends the secondary requests of one assembly
pub struct FollowUp<'a> {
    client: &'a StructuredCompletionClient,
    model: &'a str,
    timeout: Duration,
    max_output_tokens: Option<u32>,
    requests: AtomicUsize,
}

impl<'a> FollowUp<'a> {
    pub fn new(
        client: &'a StructuredCompletionClient,
        model: &'a str,
        timeout: Duration,
        max_output_tokens: Option<u32>,
    ) -> Self {
        Self {
            client,
            model,
            timeout,
            max_output_tokens,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn request(&self, system: &str, user: &str, temperature: f32) -> CompletionRequest {
        CompletionRequest::new(system, user, self.model)
            .with_temperature(temperature)
            .with_timeout(self.timeout)
            .with_max_output_tokens(self.max_output_tokens)
    }

    /// Send one request; `None` unless it succeeded with non-blank text
    pub async fn send(&self, request: CompletionRequest) -> Option<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let result = self.client.execute(&request).await;
        if !result.succeeded() {
            return None;
        }
        let text = result.raw_text().trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    pub async fn ask(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        format: ResponseFormat,
    ) -> Option<String> {
        self.send(self.request(system, user, temperature).with_response_format(format))
            .await
    }

    /// Logical requests sent so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Language correction
// =============================================================================

fn translate_text_prompt(options: &OptionsMap) -> String {
    format!(
        "Rewrite the following text naturally in {}. Keep the meaning, numbers and line \
         breaks. Do not exaggerate. Return only the rewritten text.",
        options.target_language.display_name()
    )
}

fn translate_list_prompt(options: &OptionsMap) -> String {
    format!(
        "Translate the following list into natural {}. Keep the number of lines and their \
         order, keep numbers, brackets and key terms, avoid hype. One item per line, no numbering.",
        options.target_language.display_name()
    )
}

/// Re-translate language-checked fields that are mostly ASCII letters.
///
/// Lists are judged by their first few entries and translated in one call;
/// a reply with fewer lines keeps the original entries for the missing
/// positions. Returns the names of the fields that changed.
pub async fn correct_language(
    record: &mut StructuredRecord,
    schema: &ContentSchema,
    options: &OptionsMap,
    follow_up: &FollowUp<'_>,
) -> Vec<String> {
    let mut translated = Vec::new();
    if !options.checks_language() {
        return translated;
    }
    let threshold = options.ascii_ratio_threshold;

    for spec in &schema.fields {
        let Some(value) = record.get_mut(&spec.name) else {
            continue;
        };

        let changed = match (&spec.shape, value) {
            (FieldShape::Text, FieldValue::Text(text)) if spec.language_checked => {
                translate_value(text, threshold, options, follow_up).await
            }
            (FieldShape::TextList, FieldValue::List(items)) if spec.language_checked => {
                translate_list(items, threshold, options, follow_up).await
            }
            (FieldShape::ObjectList(keys), FieldValue::Objects(entries)) => {
                let mut changed = false;
                for entry in entries.iter_mut() {
                    for key in keys.iter().filter(|k| k.language_checked) {
                        if let Some(text) = entry.get_mut(&key.name) {
                            changed |= translate_value(text, threshold, options, follow_up).await;
                        }
                    }
                }
                changed
            }
            (FieldShape::Object(keys), FieldValue::Object(entry)) => {
                let mut changed = false;
                for key in keys.iter().filter(|k| k.language_checked) {
                    if let Some(text) = entry.get_mut(&key.name) {
                        changed |= translate_value(text, threshold, options, follow_up).await;
                    }
                }
                changed
            }
            _ => false,
        };

        if changed {
            info!(field = %spec.name, "Field re-translated");
            translated.push(spec.name.clone());
        }
    }

    translated
}

async fn translate_value(
    text: &mut String,
    threshold: f64,
    options: &OptionsMap,
    follow_up: &FollowUp<'_>,
) -> bool {
    if !is_mostly_foreign(text, threshold) {
        return false;
    }
    let reply = follow_up
        .ask(
            &translate_text_prompt(options),
            text,
            network::TRANSLATE_TEMPERATURE,
            ResponseFormat::Text,
        )
        .await;
    match reply {
        Some(rewritten) if rewritten != *text => {
            *text = rewritten;
            true
        }
        _ => false,
    }
}

async fn translate_list(
    items: &mut [String],
    threshold: f64,
    options: &OptionsMap,
    follow_up: &FollowUp<'_>,
) -> bool {
    if items.is_empty()
        || !list_is_mostly_foreign(items, language_constants::LIST_SAMPLE_SIZE, threshold)
    {
        return false;
    }
    // one entry per line, or the reply cannot be aligned
    let source: Vec<String> = items
        .iter()
        .map(|item| item.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    let Some(reply) = follow_up
        .ask(
            &translate_list_prompt(options),
            &source.join("\n"),
            network::TRANSLATE_TEMPERATURE,
            ResponseFormat::Text,
        )
        .await
    else {
        return false;
    };

    let lines: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() > items.len() {
        debug!(expected = items.len(), got = lines.len(), "Translation lines do not align, keeping original");
        return false;
    }
    if lines.len() < items.len() {
        debug!(expected = items.len(), got = lines.len(), "Short translation, keeping tail");
    }

    let mut changed = false;
    for (item, line) in items.iter_mut().zip(lines) {
        if item != line {
            *item = line.to_string();
            changed = true;
        }
    }
    changed
}

// =============================================================================
// Call-to-action
// =============================================================================

fn strip_cta(text: &str, cta: &str) -> String {
    if text.contains(cta) {
        text.replace(cta, "").trim().to_string()
    } else {
        text.to_string()
    }
}

/// Remove the CTA from every field, then append it once to each CTA
/// target in promotional mode. Returns whether anything changed.
pub fn apply_cta(record: &mut StructuredRecord, schema: &ContentSchema, mode: Mode, cta: &str) -> bool {
    let cta = cta.trim();
    if cta.is_empty() {
        return false;
    }
    let mut changed = false;

    for spec in &schema.fields {
        let Some(value) = record.get_mut(&spec.name) else {
            continue;
        };
        let before = value.clone();

        match value {
            FieldValue::Text(text) => {
                let base = strip_cta(text, cta);
                *text = if spec.cta_target && mode.is_promotional() {
                    if base.is_empty() {
                        cta.to_string()
                    } else {
                        format!("{}\n\n{}", base, cta)
                    }
                } else {
                    base
                };
            }
            FieldValue::List(items) => {
                for item in items.iter_mut() {
                    *item = strip_cta(item, cta);
                }
            }
            FieldValue::Objects(entries) => {
                for entry in entries.iter_mut() {
                    for text in entry.values_mut() {
                        *text = strip_cta(text, cta);
                    }
                }
            }
            FieldValue::Object(entry) => {
                for text in entry.values_mut() {
                    *text = strip_cta(text, cta);
                }
            }
        }

        changed |= *value != before;
    }

    changed
}

// =============================================================================
// Humanize
// =============================================================================

fn humanize_system(options: &OptionsMap) -> String {
    format!(
        "You are an editor who makes {language} copy read naturally. Keep it vivid but \
         restrained: no exaggeration, exclamations or ad tone. Mix short and long \
         sentences and pause every 2~3 sentences. Let the regional context ({region}) and \
         the voice of field expert '{persona}' show through lightly. Cut repetition and \
         keep the key points in a natural flow.",
        language = options.target_language.display_name(),
        region = options.region,
        persona = options.persona,
    )
}

fn humanize_user(text: &str, mode: Mode, options: &OptionsMap) -> String {
    let mode_line = match mode {
        Mode::Promotional => "Sales mode: the call-to-action stays as the last line only; everything else is informational.",
        Mode::Informational => "Info mode: no call-to-action.",
    };
    format!(
        "{mode_line}\n\n[original]\n{text}\n\nPolish the original in {} following the rules \
         above. Keep the paragraphs; improve only rhythm and wording. Return only the text.",
        options.target_language.display_name()
    )
}

/// Polish humanize-flagged fields while the budget allows.
///
/// Returns how many values were rewritten.
pub async fn humanize(
    record: &mut StructuredRecord,
    schema: &ContentSchema,
    options: &OptionsMap,
    mode: Mode,
    follow_up: &FollowUp<'_>,
    budget: &SoftBudget,
) -> usize {
    let mut rewritten = 0;
    if !options.humanize {
        return rewritten;
    }

    for spec in &schema.fields {
        let Some(value) = record.get_mut(&spec.name) else {
            continue;
        };

        match (&spec.shape, value) {
            (FieldShape::Text, FieldValue::Text(text)) if spec.humanize => {
                match polish(text, options, mode, follow_up, budget).await {
                    Polish::Rewritten => rewritten += 1,
                    Polish::Kept => {}
                    Polish::OutOfBudget => return rewritten,
                }
            }
            (FieldShape::ObjectList(keys), FieldValue::Objects(entries)) => {
                for entry in entries.iter_mut() {
                    for key in keys.iter().filter(|k| k.humanize) {
                        let Some(text) = entry.get_mut(&key.name) else {
                            continue;
                        };
                        match polish(text, options, mode, follow_up, budget).await {
                            Polish::Rewritten => rewritten += 1,
                            Polish::Kept => {}
                            Polish::OutOfBudget => return rewritten,
                        }
                    }
                }
            }
            _ => {}
        }
    }

    rewritten
}

enum Polish {
    Rewritten,
    Kept,
    OutOfBudget,
}

async fn polish(
    text: &mut String,
    options: &OptionsMap,
    mode: Mode,
    follow_up: &FollowUp<'_>,
    budget: &SoftBudget,
) -> Polish {
    if text.trim().is_empty() {
        return Polish::Kept;
    }
    if !budget.try_begin() {
        debug!(stats = %budget.stats().summary(), "Humanize budget exhausted");
        return Polish::OutOfBudget;
    }

    let start = Instant::now();
    let reply = follow_up
        .ask(
            &humanize_system(options),
            &humanize_user(text, mode, options),
            network::HUMANIZE_TEMPERATURE,
            ResponseFormat::Text,
        )
        .await;
    budget.record(start.elapsed());

    match reply {
        Some(polished) => {
            *text = polished;
            Polish::Rewritten
        }
        None => Polish::Kept,
    }
}
