//! The page evaluator: runs a spec against raw markup and produces a
//! coverage/acceptance report.
//!
//! Evaluation is synchronous, deterministic, and never fails: a spec that
//! extracts nothing useful yields a rejected report with diagnostics, not
//! an error. Issues accumulate so the refinement loop always gets the full
//! picture.

use scraper::Html;
use url::Url;

use crate::extract::{extract_content, extract_items};
use crate::types::criteria::{resolve_criteria, Criteria};
use crate::types::report::EvaluationReport;
use crate::types::spec::{AdapterSpec, Template};

/// Base URL used when the caller supplies no page URL.
const PLACEHOLDER_BASE: &str = "https://example.com";

/// Caller context for one evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluateOptions<'a> {
    /// Expected template; a mismatch is recorded but evaluation continues
    /// so the report still carries coverage diagnostics.
    pub template_hint: Option<&'a Template>,

    /// Criteria override, merged over template defaults.
    pub criteria: Option<&'a Criteria>,

    /// Page URL, used as the base for relative-link resolution.
    pub url: Option<&'a str>,
}

/// Evaluate a spec against a page's markup.
pub fn evaluate_spec(
    spec: &AdapterSpec,
    markup: &str,
    options: &EvaluateOptions<'_>,
) -> EvaluationReport {
    let doc = Html::parse_document(markup);
    let base_url = options
        .url
        .and_then(|u| Url::parse(u).ok())
        .unwrap_or_else(|| Url::parse(PLACEHOLDER_BASE).expect("static url"));
    let criteria = resolve_criteria(&spec.template, options.criteria);

    let mut report = EvaluationReport::new(spec.template.clone());

    if let Some(hint) = options.template_hint {
        if *hint != spec.template {
            report.reject(format!(
                "template mismatch (expected {hint}, got {})",
                spec.template
            ));
        }
    }

    if spec.template.is_item_template() {
        let item_selector = spec.item_selector.as_deref().filter(|s| !s.is_empty());
        let item_selector = match item_selector {
            Some(sel) => sel,
            None => {
                // No coverage is meaningful without items.
                report.reject("itemSelector missing");
                return report;
            }
        };

        let items = match extract_items(&doc, item_selector, &spec.fields, &base_url) {
            Some(items) => items,
            None => {
                report.reject("itemSelector invalid");
                return report;
            }
        };

        let max_items = criteria
            .max_items
            .filter(|&n| n > 0)
            .or(spec.max_items.filter(|&n| n > 0))
            .unwrap_or(60);
        let trimmed = &items[..items.len().min(max_items)];
        report.set_count("items", trimmed.len());

        let min_items = criteria.min_items.filter(|&n| n > 0).unwrap_or(4);
        if trimmed.len() < min_items {
            report.reject(format!("found {} items (< {min_items})", trimmed.len()));
        }

        for (field, threshold) in &criteria.required_fields {
            let total = trimmed.len().max(1);
            let present = trimmed.iter().filter(|item| item.contains_key(field)).count();
            let rate = present as f64 / total as f64;
            report.set_rate(format!("{field}Rate"), rate);
            if rate < *threshold {
                report.reject(format!(
                    "{field} coverage {}% (< {}%)",
                    (rate * 100.0).round(),
                    (threshold * 100.0).round()
                ));
            }
        }

        // Informational price diagnostic for shopping specs where the
        // caller did not already require price or brand coverage; never
        // flips `ok`.
        if spec.template == Template::Shopping
            && !criteria.required_fields.contains_key("price")
            && !criteria.required_fields.contains_key("brand")
        {
            let total = trimmed.len().max(1);
            let present = trimmed.iter().filter(|item| item.contains_key("price")).count();
            let price_rate = present as f64 / total as f64;
            report.set_rate("priceRate", price_rate);
            if price_rate < 0.2 {
                report.note("low price coverage");
            }
        }
    }

    if spec.template == Template::Article {
        let plain = extract_content(&doc, spec.content.as_ref(), &base_url);
        let length = plain.chars().count();
        report.set_count("contentLength", length);

        let min_chars = criteria.min_content_chars.filter(|&n| n > 0).unwrap_or(400);
        if length < min_chars {
            report.reject(format!("content too short ({length} < {min_chars})"));
        }
    }

    report
}
