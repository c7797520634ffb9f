//! contentsmith - structured content packages from a single topic
//!
//! Sends schema-describing prompts to a chat-completion service, coerces the
//! free-form replies into validated records and repairs whatever is missing,
//! so callers always get a complete (possibly degraded) record back.
//!
//! ## Quick Start
//!
//! ```ignore
//! use contentsmith::{AssemblerContext, Config, ContentAssembler, OptionsMap, PackageKind};
//! use contentsmith::ai::create_provider;
//!
//! let config = Config::default();
//! let assembler = ContentAssembler::from_config(create_provider(&config.llm)?, &config);
//! let ctx = AssemblerContext::from_config(&config);
//! let assembly = assembler
//!     .assemble_package(&ctx, PackageKind::Video, "무릎 관절 관리", &OptionsMap::from_config(&config))
//!     .await?;
//! println!("{}", assembly.record().to_json());
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: completion providers, retry policy, structured client, JSON repair
//! - [`content`]: schemas, options, assembler, post-processing rules, exports
//! - [`config`]: layered configuration
//! - [`cli`]: command implementations

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod content;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{ContentError, ErrorCategory, Result};

// Client
pub use ai::{
    CompletionProvider, CompletionRequest, CompletionResult, RetryPolicy, SoftBudget,
    StructuredCompletionClient,
};

// Assembly
pub use content::{
    Assembly, AssemblyOutcome, AssemblerContext, ContentAssembler, ContentSchema, FieldSpec,
    OptionsMap, PackageKind, StructuredRecord,
};
