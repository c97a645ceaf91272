//! Language model abstraction.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion model.
///
/// Implementations wrap specific providers and handle transport; the
/// generation client treats the returned text as either well-formed
/// embedded JSON or arbitrary prose and tolerates both. Transport failures
/// are fatal for the current attempt and are never retried here.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt, returning the model's raw text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
