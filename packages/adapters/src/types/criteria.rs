//! Acceptance criteria and the criteria resolver.
//!
//! Template defaults are merged with caller overrides field-by-field:
//! top-level keys shallow-merge, `requiredFields` merges per key so an
//! override never wipes out unrelated defaults.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::spec::Template;

/// Acceptance thresholds applied by the page evaluator.
///
/// The same shape serves as template defaults and as caller overrides;
/// absent fields in an override leave the default in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Criteria {
    /// Minimum number of extracted items; the evaluator falls back to 4.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Item truncation cap; falls back to the spec's `maxItems`, then 60.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Field name to minimum coverage rate in [0, 1].
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub required_fields: IndexMap<String, f64>,

    /// Minimum article plain-text length; falls back to 400.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_content_chars: Option<usize>,
}

/// Default criteria for a template.
pub fn default_criteria(template: &Template) -> Criteria {
    let mut required = IndexMap::new();
    required.insert("title".to_string(), 0.7);
    required.insert("href".to_string(), 0.7);

    match template {
        Template::Shopping => {
            required.insert("price".to_string(), 0.3);
        }
        Template::News => {
            required.insert("source".to_string(), 0.2);
            required.insert("time".to_string(), 0.2);
        }
        _ => {}
    }

    Criteria {
        min_items: Some(6),
        max_items: None,
        required_fields: required,
        min_content_chars: Some(400),
    }
}

/// Merge template defaults with a caller override.
///
/// Pure function: no override returns the defaults unchanged; override
/// entries win per key, unspecified default entries survive.
pub fn resolve_criteria(template: &Template, overrides: Option<&Criteria>) -> Criteria {
    let defaults = default_criteria(template);
    let overrides = match overrides {
        Some(o) => o,
        None => return defaults,
    };

    let mut required_fields = defaults.required_fields;
    for (field, threshold) in &overrides.required_fields {
        required_fields.insert(field.clone(), *threshold);
    }

    Criteria {
        min_items: overrides.min_items.or(defaults.min_items),
        max_items: overrides.max_items.or(defaults.max_items),
        required_fields,
        min_content_chars: overrides.min_content_chars.or(defaults.min_content_chars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_override_returns_defaults() {
        let resolved = resolve_criteria(&Template::List, None);
        assert_eq!(resolved, default_criteria(&Template::List));
        assert_eq!(resolved.min_items, Some(6));
        assert_eq!(resolved.required_fields.get("title"), Some(&0.7));
    }

    #[test]
    fn test_shopping_defaults_add_price() {
        let resolved = resolve_criteria(&Template::Shopping, None);
        assert_eq!(resolved.required_fields.get("price"), Some(&0.3));
        assert_eq!(resolved.required_fields.get("title"), Some(&0.7));
    }

    #[test]
    fn test_news_defaults_add_source_and_time() {
        let resolved = resolve_criteria(&Template::News, None);
        assert_eq!(resolved.required_fields.get("source"), Some(&0.2));
        assert_eq!(resolved.required_fields.get("time"), Some(&0.2));
    }

    #[test]
    fn test_required_fields_merge_per_key() {
        let mut overrides = Criteria::default();
        overrides.required_fields.insert("price".to_string(), 0.9);

        let resolved = resolve_criteria(&Template::Shopping, Some(&overrides));
        // Override applied, defaults preserved: not a wholesale replacement.
        assert_eq!(resolved.required_fields.get("price"), Some(&0.9));
        assert_eq!(resolved.required_fields.get("title"), Some(&0.7));
        assert_eq!(resolved.required_fields.get("href"), Some(&0.7));
    }

    #[test]
    fn test_top_level_shallow_merge() {
        let overrides = Criteria {
            min_items: Some(10),
            ..Default::default()
        };
        let resolved = resolve_criteria(&Template::List, Some(&overrides));
        assert_eq!(resolved.min_items, Some(10));
        assert_eq!(resolved.min_content_chars, Some(400));
    }
}
