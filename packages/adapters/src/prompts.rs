//! Prompt assembly for adapter-spec generation.
//!
//! One prompt shape serves first-pass generation and repair iterations: the
//! fixed system guide describes the JSON schema and field-rule grammar, and
//! repair iterations append the previous spec and the prior evaluation
//! report as feedback.

use crate::types::criteria::Criteria;
use crate::types::report::EvaluationReport;
use crate::types::spec::{AdapterSpec, Template};

/// Fixed system guide describing the adapter JSON contract.
pub const SYSTEM_GUIDE: &str = r#"you are generating a json adapter spec for a declarative site scraper.
return json only.

format:
{
  "id": "site-name",
  "template": "list|news|shopping|article",
  "match": {"hostContains": ["example.com"], "pathPrefix": ["/news"]},
  "modeLabel": "search",
  "title": {"selector": "title", "source": "text"},
  "itemSelector": ".result",
  "fields": {
    "title": {"selector": ".title", "source": "text"},
    "href": {"selector": "a", "attr": "href", "absolute": true},
    "image": {"selector": "img", "attr": "src", "absolute": true},
    "meta": {"selector": ".meta", "source": "text"}
  },
  "searchBox": true,
  "maxItems": 60
}

use selectors that exist in the html. keep keys lowercase.
"#;

/// Per-call prompt inputs: caller hints plus refinement feedback.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationContext<'a> {
    pub template_hint: Option<&'a Template>,
    pub mode_label: Option<&'a str>,
    pub search_box: Option<bool>,
    pub criteria: Option<&'a Criteria>,
    /// Previous candidate to revise (repair iterations only).
    pub previous_spec: Option<&'a AdapterSpec>,
    /// Prior evaluation report fed back as diagnostics.
    pub evaluation: Option<&'a EvaluationReport>,
    /// 1-based refinement iteration number.
    pub iteration: Option<u32>,
}

/// Assemble the full generation prompt for one model call.
pub fn build_generation_prompt(url: &str, markup: &str, ctx: &GenerationContext<'_>) -> String {
    let mut hints: Vec<String> = Vec::new();
    if let Some(hint) = ctx.template_hint {
        hints.push(format!("template hint: {hint}"));
    }
    if let Some(label) = ctx.mode_label {
        hints.push(format!("modeLabel hint: {label}"));
    }
    if let Some(search_box) = ctx.search_box {
        hints.push(format!("searchBox hint: {search_box}"));
    }
    if let Some(criteria) = ctx.criteria {
        let serialized = serde_json::to_string(criteria).unwrap_or_default();
        hints.push(format!("criteria: {serialized}"));
    }
    if let Some(iteration) = ctx.iteration {
        hints.push(format!("iteration: {iteration}"));
    }
    let hints = hints.join("\n");

    let mut feedback: Vec<String> = Vec::new();
    if let Some(report) = ctx.evaluation {
        let serialized = serde_json::to_string_pretty(report).unwrap_or_default();
        feedback.push(format!("evaluation report:\n{serialized}"));
    }
    if let Some(spec) = ctx.previous_spec {
        let serialized = serde_json::to_string_pretty(spec).unwrap_or_default();
        feedback.push(format!("previous spec (revise it):\n{serialized}"));
    }
    let feedback = feedback.join("\n\n");

    let mut prompt = format!("{SYSTEM_GUIDE}\nurl: {url}\n");
    if !hints.is_empty() {
        prompt.push_str(&hints);
        prompt.push('\n');
    }
    prompt.push_str(&format!("html (truncated):\n{markup}\n"));
    if !feedback.is_empty() {
        prompt.push_str(&format!("\n{feedback}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{evaluate_spec, EvaluateOptions};

    #[test]
    fn test_first_pass_prompt_has_no_feedback() {
        let prompt = build_generation_prompt(
            "https://example.com",
            "<html></html>",
            &GenerationContext::default(),
        );
        assert!(prompt.contains("url: https://example.com"));
        assert!(prompt.contains("html (truncated):"));
        assert!(!prompt.contains("previous spec"));
        assert!(!prompt.contains("evaluation report"));
    }

    #[test]
    fn test_hints_are_included() {
        let ctx = GenerationContext {
            template_hint: Some(&Template::Shopping),
            mode_label: Some("search"),
            search_box: Some(true),
            iteration: Some(2),
            ..Default::default()
        };
        let prompt = build_generation_prompt("https://example.com", "<html></html>", &ctx);
        assert!(prompt.contains("template hint: shopping"));
        assert!(prompt.contains("modeLabel hint: search"));
        assert!(prompt.contains("searchBox hint: true"));
        assert!(prompt.contains("iteration: 2"));
    }

    #[test]
    fn test_feedback_carries_prior_report_and_spec() {
        let mut spec = AdapterSpec::new(Template::List);
        spec.item_selector = Some(".row".to_string());
        spec.fields.insert("title".to_string(), "h3".into());
        let report = evaluate_spec(&spec, "<html></html>", &EvaluateOptions::default());

        let ctx = GenerationContext {
            previous_spec: Some(&spec),
            evaluation: Some(&report),
            iteration: Some(2),
            ..Default::default()
        };
        let prompt = build_generation_prompt("https://example.com", "<html></html>", &ctx);
        assert!(prompt.contains("previous spec (revise it):"));
        assert!(prompt.contains("evaluation report:"));
        // The diagnostics the model needs to repair the spec are embedded.
        assert!(prompt.contains("found 0 items"));
        assert!(prompt.contains("\"itemSelector\": \".row\""));
    }
}
