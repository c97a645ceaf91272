//! The refinement loop: generate, evaluate, feed the diagnostics back,
//! and regenerate, up to a bounded iteration count.
//!
//! The loop never fails on quality grounds: it always returns the
//! last-seen spec/report pair even if no iteration was accepted, because a
//! partially-working adapter is preferable to none and the caller decides
//! whether to keep it. Only transport failures and irrecoverably malformed
//! model output propagate as errors.

use tracing::{debug, info};

use crate::error::Result;
use crate::evaluate::{evaluate_spec, EvaluateOptions};
use crate::generate::SpecGenerator;
use crate::prompts::GenerationContext;
use crate::traits::model::LanguageModel;
use crate::types::criteria::Criteria;
use crate::types::report::EvaluationReport;
use crate::types::spec::{AdapterSpec, Template};

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 4;

/// Caller options for one refinement run.
#[derive(Debug, Clone, Default)]
pub struct RefineOptions {
    pub template_hint: Option<Template>,
    pub mode_label: Option<String>,
    pub search_box: Option<bool>,
    pub criteria: Option<Criteria>,
    /// Iteration budget; defaults to 4, floored at 1.
    pub max_iterations: Option<u32>,
}

/// Result of a refinement run.
#[derive(Debug, Clone)]
pub struct RefineOutcome {
    /// The accepted spec, or the final candidate on exhaustion.
    pub spec: AdapterSpec,
    /// The report for `spec`; `ok` conveys whether it was accepted.
    pub report: EvaluationReport,
    /// Number of generate+evaluate round trips performed.
    pub iterations: u32,
}

/// Run the bounded generate-evaluate-feedback loop.
///
/// Each iteration's prompt carries the immediately preceding spec and
/// report (single-previous-report memory, not full history); iterations
/// execute strictly sequentially because each prompt depends on the prior
/// report.
pub async fn refine_spec<M: LanguageModel>(
    generator: &SpecGenerator<M>,
    url: &str,
    markup: &str,
    options: &RefineOptions,
) -> Result<RefineOutcome> {
    let max_iterations = options
        .max_iterations
        .unwrap_or(DEFAULT_MAX_ITERATIONS)
        .max(1);

    let mut previous: Option<(AdapterSpec, EvaluationReport)> = None;
    let mut iteration = 1;

    loop {
        let ctx = GenerationContext {
            template_hint: options.template_hint.as_ref(),
            mode_label: options.mode_label.as_deref(),
            search_box: options.search_box,
            criteria: options.criteria.as_ref(),
            previous_spec: previous.as_ref().map(|(spec, _)| spec),
            evaluation: previous.as_ref().map(|(_, report)| report),
            iteration: Some(iteration),
        };
        let spec = generator.generate(url, markup, &ctx).await?;

        let eval_options = EvaluateOptions {
            template_hint: options.template_hint.as_ref(),
            criteria: options.criteria.as_ref(),
            url: Some(url),
        };
        let report = evaluate_spec(&spec, markup, &eval_options);

        if report.ok {
            info!(url, iteration, "adapter spec accepted");
            return Ok(RefineOutcome { spec, report, iterations: iteration });
        }
        if iteration >= max_iterations {
            info!(url, iteration, "iteration budget exhausted, returning last candidate");
            return Ok(RefineOutcome { spec, report, iterations: iteration });
        }

        debug!(url, iteration, issues = ?report.issues, "candidate rejected, refining");
        previous = Some((spec, report));
        iteration += 1;
    }
}
