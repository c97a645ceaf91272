//! The generation client: prompt the model for a candidate spec, extract
//! and validate its JSON output, and retry once on malformed output.
//!
//! The bounded 2-attempt retry guards against transient model flakiness
//! (truncated or garbled JSON); quality improvement is the refinement
//! loop's job, layered on top. Transport failures propagate immediately.

use serde_json::Value;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::prompts::{build_generation_prompt, GenerationContext};
use crate::traits::model::LanguageModel;
use crate::types::spec::{validate, AdapterSpec};

/// Total attempts per generation call, including the first.
pub const MAX_GENERATION_ATTEMPTS: u32 = 2;

/// Generates candidate adapter specs via a language model.
pub struct SpecGenerator<M: LanguageModel> {
    model: M,
}

impl<M: LanguageModel> SpecGenerator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Access the underlying model (mainly for test assertions).
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Generate one validated candidate spec.
    ///
    /// Malformed output (unparsable JSON or a structurally invalid spec)
    /// is retried once with the failure fed back as an explicit error
    /// hint; a second failure is fatal.
    pub async fn generate(
        &self,
        url: &str,
        markup: &str,
        ctx: &GenerationContext<'_>,
    ) -> Result<AdapterSpec> {
        let mut error_hint: Option<String> = None;
        let mut attempt = 1;

        loop {
            let mut prompt = build_generation_prompt(url, markup, ctx);
            if let Some(hint) = &error_hint {
                prompt.push_str(&format!(
                    "\nvalidation error: {hint}\nfix and return json only."
                ));
            }

            let raw = self.model.complete(&prompt).await?;

            let candidate = match extract_json(&raw) {
                Some(candidate) => candidate,
                None => {
                    if attempt >= MAX_GENERATION_ATTEMPTS {
                        return Err(AdapterError::SpecParse);
                    }
                    debug!(attempt, url, "model output had no parsable json");
                    error_hint = Some("json parse failed".to_string());
                    attempt += 1;
                    continue;
                }
            };

            if let Err(reason) = validate(&candidate) {
                if attempt >= MAX_GENERATION_ATTEMPTS {
                    return Err(AdapterError::InvalidSpec(reason));
                }
                debug!(attempt, url, %reason, "candidate spec failed validation");
                error_hint = Some(reason);
                attempt += 1;
                continue;
            }

            match serde_json::from_value::<AdapterSpec>(candidate) {
                Ok(spec) => return Ok(spec),
                Err(err) => {
                    if attempt >= MAX_GENERATION_ATTEMPTS {
                        return Err(AdapterError::InvalidSpec(err.to_string()));
                    }
                    debug!(attempt, url, %err, "candidate spec failed deserialization");
                    error_hint = Some(err.to_string());
                    attempt += 1;
                }
            }
        }
    }
}

/// Pull the first JSON object out of raw model text.
///
/// Locates the first `{` and the last `}` and parses that slice, which
/// tolerates prose wrapped around the JSON.
pub(crate) fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
