//! Typed errors for the adapter library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to keep the failure
//! taxonomy explicit: transport/model failures and irrecoverably malformed
//! model output are errors; a low-quality but well-formed spec is ordinary
//! control flow carried in the evaluation report.

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while generating or serving adapter specs.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Model call failed (network error or non-success API status).
    ///
    /// Fatal for the current generation attempt; never retried by the
    /// generation client itself.
    #[error("model call failed: {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Model output contained no parsable JSON after all attempts.
    #[error("could not parse adapter json")]
    SpecParse,

    /// Model output parsed but failed structural validation after all attempts.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// Page fetch failed.
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input URL could not be parsed.
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },

    /// Configuration error (missing or malformed environment variable).
    #[error("config error: {0}")]
    Config(String),

    /// JSON (de)serialization error outside the model-output path.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error surfaced from a de-duplicated in-flight task shared with
    /// another caller.
    #[error(transparent)]
    Shared(Arc<AdapterError>),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
