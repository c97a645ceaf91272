//! The evaluation report: coverage diagnostics and acceptance verdict.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::spec::Template;

/// Result of running a spec against a page's markup.
///
/// Issues accumulate rather than short-circuiting, so a rejected report
/// still carries every diagnostic the refinement loop can feed back into
/// the next generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub ok: bool,
    pub template: Template,
    pub issues: Vec<String>,
    /// Item count, per-field coverage rates in [0, 1] (two decimals), and
    /// content length for articles.
    pub counts: IndexMap<String, Number>,
}

impl EvaluationReport {
    /// Fresh report, accepted until an issue marks it otherwise.
    pub fn new(template: Template) -> Self {
        Self {
            ok: true,
            template,
            issues: Vec::new(),
            counts: IndexMap::new(),
        }
    }

    /// Record a rejection reason and flip `ok`.
    pub fn reject(&mut self, issue: impl Into<String>) {
        self.ok = false;
        self.issues.push(issue.into());
    }

    /// Record an informational issue without flipping `ok`.
    pub fn note(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    /// Record an integer count.
    pub fn set_count(&mut self, key: impl Into<String>, value: usize) {
        self.counts.insert(key.into(), Number::from(value as u64));
    }

    /// Record a coverage rate, rounded to two decimals.
    pub fn set_rate(&mut self, key: impl Into<String>, rate: f64) {
        let rounded = (rate * 100.0).round() / 100.0;
        let number = Number::from_f64(rounded).unwrap_or_else(|| Number::from(0));
        self.counts.insert(key.into(), number);
    }

    /// Read back a count as f64 (rates and integer counts alike).
    pub fn count(&self, key: &str) -> Option<f64> {
        self.counts.get(key).and_then(Number::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_accumulates_issues() {
        let mut report = EvaluationReport::new(Template::List);
        assert!(report.ok);

        report.reject("first");
        report.reject("second");
        assert!(!report.ok);
        assert_eq!(report.issues, vec!["first", "second"]);
    }

    #[test]
    fn test_note_keeps_ok() {
        let mut report = EvaluationReport::new(Template::Shopping);
        report.note("low price coverage");
        assert!(report.ok);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_rate_rounds_to_two_decimals() {
        let mut report = EvaluationReport::new(Template::List);
        report.set_rate("titleRate", 2.0 / 3.0);
        assert_eq!(report.count("titleRate"), Some(0.67));
    }

    #[test]
    fn test_counts_serialize_as_numbers() {
        let mut report = EvaluationReport::new(Template::List);
        report.set_count("items", 10);
        report.set_rate("titleRate", 0.8);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["counts"]["items"], 10);
        assert_eq!(json["counts"]["titleRate"], 0.8);
    }
}
