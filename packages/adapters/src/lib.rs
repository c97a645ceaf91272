//! LLM-Generated Site Adapters
//!
//! Given an arbitrary webpage, synthesize a declarative extraction spec
//! (a "site adapter") via a language model, then mechanically score that
//! spec against the page's actual markup to decide whether to accept,
//! retry, or iteratively repair it.
//!
//! # Design Philosophy
//!
//! **Generation proposes, evaluation disposes**
//!
//! - The model only ever produces candidates; acceptance is decided by a
//!   deterministic evaluator with explicit coverage thresholds
//! - Rejection is data, not an error: diagnostics feed the next prompt
//! - Extraction degrades gracefully; one bad field rule never poisons the
//!   rest of an item
//! - All iteration is bounded: 2 attempts per generation, 4 refinement
//!   iterations by default
//!
//! # Usage
//!
//! ```rust,ignore
//! use adapters::{AdapterService, HttpFetcher, OpenAiModel, ServiceConfig};
//!
//! let service = AdapterService::new(
//!     OpenAiModel::from_env()?,
//!     HttpFetcher::new()?,
//!     ServiceConfig::from_env()?,
//! );
//!
//! // Cached adapter, or a fresh refinement run on a miss.
//! let spec = service.ensure_adapter("https://shop.example/catalog", None).await?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Adapter specs, field rules, criteria, evaluation reports
//! - [`extract`] - Deterministic field extraction from parsed markup
//! - [`evaluate`] - Spec scoring against a page's markup
//! - [`generate`] - Model-backed spec generation with bounded retry
//! - [`refine`] - The generate-evaluate-feedback loop
//! - [`store`] - Persisted adapter store and URL matching
//! - [`service`] - Process-level facade with in-flight de-duplication
//! - [`testing`] - Mock model/fetcher for tests

pub mod config;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod fetch;
pub mod generate;
pub mod inflight;
pub mod llm;
pub mod prompts;
pub mod refine;
pub mod service;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::ServiceConfig;
pub use error::{AdapterError, Result};
pub use traits::{fetcher::PageFetcher, model::LanguageModel};
pub use types::{
    criteria::{default_criteria, resolve_criteria, Criteria},
    report::EvaluationReport,
    spec::{validate, AdapterSpec, FieldRule, FieldRuleSpec, MatchRule, Template, ValueSource},
};

// Re-export pipeline components
pub use evaluate::{evaluate_spec, EvaluateOptions};
pub use extract::{extract_content, extract_field, extract_items};
pub use generate::{SpecGenerator, MAX_GENERATION_ATTEMPTS};
pub use prompts::{build_generation_prompt, GenerationContext};
pub use refine::{refine_spec, RefineOptions, RefineOutcome, DEFAULT_MAX_ITERATIONS};

// Re-export the service layer
pub use fetch::HttpFetcher;
pub use inflight::InflightMap;
pub use llm::OpenAiModel;
pub use service::{AdapterLookup, AdapterService};
pub use store::AdapterStore;

// Re-export testing utilities
pub use testing::{MockFetcher, MockModel};
