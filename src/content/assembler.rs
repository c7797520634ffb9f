//! Content assembly
//!
//! [`ContentAssembler::assemble`] turns a topic, options and schema into a
//! complete [`StructuredRecord`]. One assembly runs its requests strictly in
//! sequence:
//!
//! ```text
//! Building → AwaitingPrimary → (ParseOk | ParseRetry) → Validating
//!          → (Padding | Expanding | Translating)* → Done
//! ```
//!
//! Transport failures and unparseable replies never surface as errors. They
//! produce an [`AssemblyOutcome::Degraded`] record built from the schema's
//! placeholders. A JSON object with none of the schema's fields counts as
//! unparseable. Once a reply has been parsed, the record stays `Parsed` even
//! if the deadline cuts the follow-up requests short. The only errors are configuration problems (an invalid
//! schema), reported before any request is sent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::options::{Mode, OptionsMap};
use super::packages::PackageKind;
use super::rules::{self, FollowUp};
use super::schema::{ContentSchema, FieldShape, FieldValue, Shortfall, StructuredRecord};
use crate::ai::budget::{SharedBudget, SoftBudget};
use crate::ai::validation::{ParseOutcome, looks_like_json, parse_structured};
use crate::ai::{
    CompletionRequest, PromptBuilder, ResponseFormat, RetryPolicy, SharedProvider,
    StructuredCompletionClient, with_timeout_map,
};
use crate::config::Config;
use crate::constants::{content as content_constants, network};
use crate::types::{Result, char_count, preview};

/// Appended to the original instructions for the one corrective request
const CORRECTIVE_DIRECTIVE: &str = "Your previous reply could not be parsed. Return ONLY a single \
     JSON object that matches [schema]. No prose, no markdown fences, no comments.";

// =============================================================================
// Context
// =============================================================================

/// Per-session state shared by every assembly of one run.
///
/// Cheap to clone; the budget behind it is shared.
#[derive(Debug, Clone)]
pub struct AssemblerContext {
    pub session_id: Uuid,
    pub budget: SharedBudget,
}

impl AssemblerContext {
    pub fn new(budget: SoftBudget) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            budget: Arc::new(budget),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(SoftBudget::from_config(&config.budget))
    }
}

// =============================================================================
// Outcome and report
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Building,
    AwaitingPrimary,
    ParseOk,
    ParseRetry,
    Validating,
    Padding,
    Expanding,
    Translating,
    Done,
}

impl AssemblyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::AwaitingPrimary => "awaiting_primary",
            Self::ParseOk => "parse_ok",
            Self::ParseRetry => "parse_retry",
            Self::Validating => "validating",
            Self::Padding => "padding",
            Self::Expanding => "expanding",
            Self::Translating => "translating",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one minimum-length check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthCheck {
    pub field: String,
    pub required: usize,
    pub before: usize,
    pub after: usize,
    /// Whether the expansion reply replaced the original text
    pub expanded: bool,
}

impl LengthCheck {
    pub fn satisfied(&self) -> bool {
        self.after >= self.required
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyOutcome {
    /// Built from a parsed model reply
    Parsed(StructuredRecord),
    /// Built locally after the remote path failed
    Degraded(StructuredRecord),
}

/// What happened during one assembly
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub mode: Mode,
    pub trace: Vec<AssemblyState>,
    /// Logical requests sent (retries not counted)
    pub remote_calls: usize,
    /// Provider attempts across primary and corrective requests
    pub attempts: usize,
    pub shortfalls: Vec<Shortfall>,
    pub expansions: Vec<LengthCheck>,
    pub translated: Vec<String>,
    pub humanized: usize,
    pub deadline_exceeded: bool,
    pub elapsed: Duration,
}

impl AssemblyReport {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            trace: vec![AssemblyState::Building],
            remote_calls: 0,
            attempts: 0,
            shortfalls: Vec::new(),
            expansions: Vec::new(),
            translated: Vec::new(),
            humanized: 0,
            deadline_exceeded: false,
            elapsed: Duration::ZERO,
        }
    }

    fn enter(&mut self, state: AssemblyState) {
        debug!(state = %state, "Assembly state");
        self.trace.push(state);
    }

    pub fn visited(&self, state: AssemblyState) -> bool {
        self.trace.contains(&state)
    }

    /// e.g. `building → awaiting_primary → parse_ok → validating → done`
    pub fn trace_line(&self) -> String {
        self.trace
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub outcome: AssemblyOutcome,
    pub report: AssemblyReport,
}

impl Assembly {
    pub fn record(&self) -> &StructuredRecord {
        match &self.outcome {
            AssemblyOutcome::Parsed(record) | AssemblyOutcome::Degraded(record) => record,
        }
    }

    pub fn into_record(self) -> StructuredRecord {
        match self.outcome {
            AssemblyOutcome::Parsed(record) | AssemblyOutcome::Degraded(record) => record,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, AssemblyOutcome::Degraded(_))
    }
}

// =============================================================================
// Assembler
// =============================================================================

#[derive(Clone)]
pub struct ContentAssembler {
    client: StructuredCompletionClient,
    model: String,
    temperature: f32,
    request_timeout: Duration,
    max_output_tokens: Option<u32>,
    overall_deadline: Duration,
    expansion_deadline: Duration,
}

impl ContentAssembler {
    pub fn new(client: StructuredCompletionClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: network::DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(network::DEFAULT_TIMEOUT_SECS),
            max_output_tokens: Some(network::DEFAULT_MAX_TOKENS),
            overall_deadline: Duration::from_secs(content_constants::OVERALL_DEADLINE_SECS),
            expansion_deadline: Duration::from_secs(content_constants::EXPANSION_DEADLINE_SECS),
        }
    }

    pub fn from_config(provider: SharedProvider, config: &Config) -> Self {
        let policy = RetryPolicy::from_config(&config.retry, &config.llm);
        Self::new(StructuredCompletionClient::new(provider, policy), &config.llm.model)
            .with_temperature(config.llm.temperature)
            .with_request_timeout(Duration::from_secs(config.llm.timeout_secs))
            .with_max_output_tokens(Some(config.llm.max_tokens))
            .with_deadlines(
                Duration::from_secs(config.content.overall_deadline_secs),
                Duration::from_secs(config.content.expansion_deadline_secs),
            )
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_deadlines(mut self, overall: Duration, expansion: Duration) -> Self {
        self.overall_deadline = overall;
        self.expansion_deadline = expansion;
        self
    }

    pub fn client(&self) -> &StructuredCompletionClient {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Assemble a record for an arbitrary schema using generic instructions
    pub async fn assemble(
        &self,
        ctx: &AssemblerContext,
        topic: &str,
        options: &OptionsMap,
        schema: &ContentSchema,
    ) -> Result<Assembly> {
        let mode = options.resolve_mode(topic);
        let (system, user) = schema_instructions(topic, options, mode, schema);
        self.assemble_with(ctx, topic, options, schema, mode, &system, &user)
            .await
    }

    /// Assemble one of the built-in packages with its own instructions
    pub async fn assemble_package(
        &self,
        ctx: &AssemblerContext,
        kind: PackageKind,
        topic: &str,
        options: &OptionsMap,
    ) -> Result<Assembly> {
        let schema = kind.schema(options);
        let mode = options.resolve_mode(topic);
        let (system, user) = kind.instructions(topic, options, mode, &schema);
        self.assemble_with(ctx, topic, options, &schema, mode, &system, &user)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(session = %ctx.session_id, schema = %schema.name, mode = mode.as_str()))]
    async fn assemble_with(
        &self,
        ctx: &AssemblerContext,
        topic: &str,
        options: &OptionsMap,
        schema: &ContentSchema,
        mode: Mode,
        system: &str,
        user: &str,
    ) -> Result<Assembly> {
        schema.validate()?;
        let start = Instant::now();
        let deadline = (!self.overall_deadline.is_zero())
            .then(|| tokio::time::Instant::now() + self.overall_deadline);
        let mut report = AssemblyReport::new(mode);
        debug!(
            worst_case_secs = self.client.policy().worst_case(self.request_timeout).as_secs(),
            "Primary request bound"
        );

        let request = CompletionRequest::new(system, user, &self.model)
            .with_temperature(self.temperature)
            .with_timeout(self.request_timeout)
            .with_max_output_tokens(self.max_output_tokens)
            .with_response_format(ResponseFormat::Json);

        report.enter(AssemblyState::AwaitingPrimary);
        let obtained = within(deadline, self.obtain_record(&request, schema, &mut report)).await;

        let outcome = match obtained {
            None => {
                self.note_deadline(&mut report, "primary");
                AssemblyOutcome::Degraded(fallback_record(schema, topic, mode, options))
            }
            Some(None) => {
                let mut record = StructuredRecord::default();
                report.enter(AssemblyState::Validating);
                report.shortfalls = record.normalize(schema, topic);
                report.enter(AssemblyState::Padding);
                rules::apply_cta(&mut record, schema, mode, &options.cta);
                AssemblyOutcome::Degraded(record)
            }
            Some(Some(mut record)) => {
                report.enter(AssemblyState::Validating);
                report.shortfalls = record.normalize(schema, topic);
                if !report.shortfalls.is_empty() {
                    report.enter(AssemblyState::Padding);
                    for shortfall in &report.shortfalls {
                        debug!(%shortfall, "Filled locally");
                    }
                }

                let follow_up = FollowUp::new(
                    &self.client,
                    &self.model,
                    self.request_timeout,
                    self.max_output_tokens,
                );
                let refine = self.refine(ctx, &mut record, schema, options, mode, &follow_up, &mut report);
                let refined = within(deadline, refine).await;
                report.remote_calls += follow_up.request_count();
                if refined.is_none() {
                    self.note_deadline(&mut report, "follow-ups");
                }

                // an interrupted pass may leave the CTA stripped, and CTA
                // removal can blank a field
                rules::apply_cta(&mut record, schema, mode, &options.cta);
                let late = record.normalize(schema, topic);
                report.shortfalls.extend(late);
                AssemblyOutcome::Parsed(record)
            }
        };

        report.enter(AssemblyState::Done);
        report.elapsed = start.elapsed();
        match &outcome {
            AssemblyOutcome::Parsed(_) => info!(
                calls = report.remote_calls,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Assembly complete"
            ),
            AssemblyOutcome::Degraded(_) => warn!(
                calls = report.remote_calls,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Assembly degraded to placeholders"
            ),
        }

        Ok(Assembly { outcome, report })
    }

    fn note_deadline(&self, report: &mut AssemblyReport, phase: &str) {
        warn!(
            deadline_secs = self.overall_deadline.as_secs_f64(),
            phase,
            "Assembly deadline exceeded"
        );
        report.deadline_exceeded = true;
    }

    /// Expansion, language correction and humanizing of a parsed record.
    ///
    /// Each step writes a field only after its reply arrived, so dropping
    /// this future at the deadline leaves `record` consistent.
    #[allow(clippy::too_many_arguments)]
    async fn refine(
        &self,
        ctx: &AssemblerContext,
        record: &mut StructuredRecord,
        schema: &ContentSchema,
        options: &OptionsMap,
        mode: Mode,
        follow_up: &FollowUp<'_>,
        report: &mut AssemblyReport,
    ) {
        self.expand_short_fields(record, schema, follow_up, report)
            .await;

        report.translated = rules::correct_language(record, schema, options, follow_up).await;
        if !report.translated.is_empty() {
            report.enter(AssemblyState::Translating);
        }

        rules::apply_cta(record, schema, mode, &options.cta);
        report.humanized =
            rules::humanize(record, schema, options, mode, follow_up, &ctx.budget).await;
    }

    /// Primary request, then at most one corrective request.
    ///
    /// A reply only counts when it yields at least one schema field.
    async fn obtain_record(
        &self,
        request: &CompletionRequest,
        schema: &ContentSchema,
        report: &mut AssemblyReport,
    ) -> Option<StructuredRecord> {
        report.remote_calls += 1;
        let primary = self.client.execute(request).await;
        report.attempts += primary.attempt_count();

        if !primary.succeeded() {
            warn!(
                error = ?primary.error_kind(),
                attempts = primary.attempt_count(),
                "Primary request failed"
            );
            return None;
        }

        match parse_structured(primary.raw_text()) {
            ParseOutcome::Parsed { object, stage } => {
                if let Some(record) = schema_record(schema, &object) {
                    debug!(?stage, "Primary reply parsed");
                    report.enter(AssemblyState::ParseOk);
                    return Some(record);
                }
                warn!(
                    reply = %preview(primary.raw_text(), 120),
                    "Primary reply has no schema fields, sending corrective request"
                );
            }
            ParseOutcome::Malformed => {
                warn!(
                    reply = %preview(primary.raw_text(), 120),
                    "Primary reply is not structured, sending corrective request"
                );
            }
        }
        report.enter(AssemblyState::ParseRetry);

        let corrective = CompletionRequest::new(
            &request.system_instructions,
            format!("{}\n\n{}", request.user_instructions, CORRECTIVE_DIRECTIVE),
            &request.model_id,
        )
        .with_temperature(request.temperature)
        .with_timeout(request.timeout)
        .with_max_output_tokens(request.max_output_tokens)
        .with_response_format(ResponseFormat::Json);

        report.remote_calls += 1;
        let retry = self.client.execute(&corrective).await;
        report.attempts += retry.attempt_count();
        if !retry.succeeded() {
            return None;
        }
        let object = parse_structured(retry.raw_text()).into_object()?;
        schema_record(schema, &object)
    }

    /// One expansion request per text field below its minimum length.
    ///
    /// A reply replaces the original only when it is non-empty and longer.
    async fn expand_short_fields(
        &self,
        record: &mut StructuredRecord,
        schema: &ContentSchema,
        follow_up: &FollowUp<'_>,
        report: &mut AssemblyReport,
    ) {

        for spec in &schema.fields {
            let (Some(required), FieldShape::Text) = (spec.min_length, &spec.shape) else {
                continue;
            };
            let Some(original) = record.text(&spec.name).map(str::to_string) else {
                continue;
            };
            let before = char_count(&original);
            if before >= required {
                report.expansions.push(LengthCheck {
                    field: spec.name.clone(),
                    required,
                    before,
                    after: before,
                    expanded: false,
                });
                continue;
            }

            report.enter(AssemblyState::Expanding);
            let target = required + content_constants::EXPANSION_MARGIN;
            let user = format!(
                "Expand the text below to at least {target} characters. Keep its structure, \
                 headings and every [이미지:...] marker. Return JSON ONLY as {{\"{name}\": \"...\"}}.\n\n{original}",
                name = spec.name,
            );
            let request = follow_up
                .request(
                    "You are an editor who lengthens drafts without changing their meaning.",
                    &user,
                    network::EXPAND_TEMPERATURE,
                )
                .with_timeout(self.request_timeout.min(self.expansion_deadline))
                .with_response_format(ResponseFormat::Json);

            let reply = with_timeout_map(self.expansion_deadline, follow_up.send(request), "expansion")
                .await
                .ok()
                .flatten();

            let expanded = reply
                .and_then(|raw| expansion_text(&raw, &spec.name))
                .filter(|text| char_count(text) > before);

            let check = match expanded {
                Some(text) => {
                    let after = char_count(&text);
                    record.set(&spec.name, FieldValue::Text(text));
                    LengthCheck { field: spec.name.clone(), required, before, after, expanded: true }
                }
                None => LengthCheck {
                    field: spec.name.clone(),
                    required,
                    before,
                    after: before,
                    expanded: false,
                },
            };
            if check.satisfied() {
                info!(field = %check.field, before, after = check.after, "Field expanded");
            } else {
                warn!(
                    field = %check.field,
                    required,
                    after = check.after,
                    "Field still below minimum length"
                );
            }
            report.expansions.push(check);
        }
    }
}

/// The expanded text from a reply: the named field of a JSON reply, or the
/// reply itself when it is plain text
fn expansion_text(raw: &str, field: &str) -> Option<String> {
    let text = if looks_like_json(raw) {
        let object = parse_structured(raw).into_object()?;
        match object.get(field) {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => object
                .values()
                .find_map(|v| v.as_str().map(str::to_string))?,
        }
    } else {
        raw.to_string()
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Record built from `object`, or `None` when no schema field survives
fn schema_record(
    schema: &ContentSchema,
    object: &serde_json::Map<String, serde_json::Value>,
) -> Option<StructuredRecord> {
    let record = StructuredRecord::from_value(schema, object);
    (!record.is_empty()).then_some(record)
}

/// Run `future` to completion, or until `deadline` when there is one
async fn within<F: std::future::IntoFuture>(
    deadline: Option<tokio::time::Instant>,
    future: F,
) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, future).await.ok(),
        None => Some(future.await),
    }
}

/// Placeholder record with the mode's CTA rule applied
fn fallback_record(
    schema: &ContentSchema,
    topic: &str,
    mode: Mode,
    options: &OptionsMap,
) -> StructuredRecord {
    let mut record = schema.synthesize(topic);
    rules::apply_cta(&mut record, schema, mode, &options.cta);
    record
}

/// Generic instructions describing `schema`
pub fn schema_instructions(
    topic: &str,
    options: &OptionsMap,
    mode: Mode,
    schema: &ContentSchema,
) -> (String, String) {
    let language = options.target_language.display_name();
    let role = format!(
        "You write structured {} content. Return STRICT JSON ONLY.",
        language
    );
    let language_rule = format!("Write every text value in {}.", language);
    let style_rule = format!("Style: {}", options.style.directive());

    let system = PromptBuilder::new()
        .role(&role)
        .rules(
            "rules",
            vec![
                language_rule.as_str(),
                style_rule.as_str(),
                "Lists must have exactly the number of entries shown in [schema].",
                mode.cta_directive(),
            ],
        )
        .build();

    let user = PromptBuilder::new()
        .field("topic", topic.trim())
        .field("tone", options.style.label())
        .field("mode", mode.as_str())
        .section("schema", &schema.skeleton())
        .build();

    (system, user)
}
