//! The adapter specification: a declarative contract describing how to
//! extract structured items or article content from one site's markup.
//!
//! Specs are produced by the generation client from model output, validated
//! at that single parse boundary, and treated as immutable values everywhere
//! else (the evaluator and refinement loop never mutate a spec in place).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Upper bound on compiled size for model-supplied regex patterns.
///
/// Patterns originate from untrusted model output embedded in page-derived
/// prompts, so compilation is treated as a capability boundary.
pub(crate) const REGEX_SIZE_LIMIT: usize = 1 << 18;

/// The extraction shape a spec targets.
///
/// Unknown template strings deserialize into [`Template::Other`]: the
/// validator deliberately performs no enum check, so a malformed template
/// surfaces later as an evaluator rejection rather than a validator error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    List,
    News,
    Shopping,
    Article,
    #[serde(untagged)]
    Other(String),
}

impl Template {
    /// Templates that extract repeated items via `itemSelector`.
    pub fn is_item_template(&self) -> bool {
        matches!(self, Template::List | Template::News | Template::Shopping)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::List => write!(f, "list"),
            Template::News => write!(f, "news"),
            Template::Shopping => write!(f, "shopping"),
            Template::Article => write!(f, "article"),
            Template::Other(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for Template {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "list" => Template::List,
            "news" => Template::News,
            "shopping" => Template::Shopping,
            "article" => Template::Article,
            _ => Template::Other(s.to_string()),
        })
    }
}

/// Where a field's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    #[default]
    Text,
    Html,
}

/// The sub-specification for extracting one named value from a scope node.
///
/// Either a bare selector string (shorthand) or a full rule object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRule {
    /// Shorthand: just a selector, text source, no post-processing.
    Selector(String),
    /// Full rule object.
    Rule(FieldRuleSpec),
}

/// The full field-rule object shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRuleSpec {
    /// CSS selector scoped to the item node; absent means "use the scope
    /// node itself".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Read this attribute instead of text/markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,

    /// Raw value source when `attr` is unset.
    #[serde(skip_serializing_if = "is_default_source")]
    pub source: ValueSource,

    /// Post-extraction capture-group filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Force or forbid URL resolution against the page base URL. Defaults
    /// to true for fields named "href" or "image".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<bool>,
}

fn is_default_source(source: &ValueSource) -> bool {
    *source == ValueSource::Text
}

impl FieldRule {
    /// Normalize the shorthand form into a borrowed view of the full shape.
    pub fn view(&self) -> FieldRuleView<'_> {
        match self {
            FieldRule::Selector(sel) => FieldRuleView {
                selector: Some(sel.as_str()),
                attr: None,
                source: ValueSource::Text,
                regex: None,
                absolute: None,
            },
            FieldRule::Rule(rule) => FieldRuleView {
                selector: rule.selector.as_deref(),
                attr: rule.attr.as_deref(),
                source: rule.source,
                regex: rule.regex.as_deref(),
                absolute: rule.absolute,
            },
        }
    }
}

impl From<&str> for FieldRule {
    fn from(selector: &str) -> Self {
        FieldRule::Selector(selector.to_string())
    }
}

/// Borrowed, normalized view of a field rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldRuleView<'a> {
    pub selector: Option<&'a str>,
    pub attr: Option<&'a str>,
    pub source: ValueSource,
    pub regex: Option<&'a str>,
    pub absolute: Option<bool>,
}

/// URL matching rule for stored specs.
///
/// Any non-empty list must have at least one member match; empty or absent
/// lists impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_contains: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_prefix: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub url_regex: Vec<String>,
}

impl MatchRule {
    /// Whether this rule matches the given URL.
    pub fn matches(&self, url: &Url) -> bool {
        if !self.host_contains.is_empty() {
            let host = url.host_str().unwrap_or("").to_ascii_lowercase();
            let ok = self
                .host_contains
                .iter()
                .any(|needle| host.contains(&needle.to_ascii_lowercase()));
            if !ok {
                return false;
            }
        }

        if !self.path_prefix.is_empty() {
            let path = url.path();
            if !self.path_prefix.iter().any(|prefix| path.starts_with(prefix.as_str())) {
                return false;
            }
        }

        if !self.url_regex.is_empty() {
            let target = url.as_str();
            // A pattern that fails to compile simply never matches.
            let ok = self.url_regex.iter().any(|pattern| {
                RegexBuilder::new(pattern)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map(|re| re.is_match(target))
                    .unwrap_or(false)
            });
            if !ok {
                return false;
            }
        }

        true
    }
}

/// A declarative site adapter specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterSpec {
    /// Stable site/template slug. Specs without an id are always appended
    /// on upsert rather than replacing an existing entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub template: Template,

    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_rule: Option<MatchRule>,

    /// Selector identifying repeated item nodes. Required for item
    /// templates, enforced by [`validate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_selector: Option<String>,

    /// Logical field name to extraction rule, evaluated per item node.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, FieldRule>,

    /// Page-level title rule (presentation hint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<FieldRule>,

    /// Article body rule (article template only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<FieldRule>,

    /// Article byline rule (article template only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<FieldRule>,

    /// Cap on extracted items; the evaluator falls back to 60.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Presentation hint, opaque to the evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_box: Option<bool>,

    /// Presentation hint, opaque to the evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_label: Option<String>,

    /// Stamped on every store write; drives TTL staleness checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AdapterSpec {
    /// Minimal spec for a given template, useful as a building block in
    /// tests and programmatic construction.
    pub fn new(template: Template) -> Self {
        Self {
            id: None,
            template,
            match_rule: None,
            item_selector: None,
            fields: IndexMap::new(),
            title: None,
            content: None,
            byline: None,
            max_items: None,
            search_box: None,
            mode_label: None,
            updated_at: None,
        }
    }
}

/// JS-style truthiness, applied to raw candidate values before typing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Structural validation of a raw candidate spec, run immediately after
/// model-output extraction and before typed deserialization.
///
/// Rules are checked in order, first failure wins:
/// 1. candidate must be a non-null object;
/// 2. `template` must be present and truthy (no enum check here);
/// 3. item templates require `itemSelector` and an object `fields`.
pub fn validate(candidate: &Value) -> Result<(), String> {
    let obj = match candidate.as_object() {
        Some(obj) => obj,
        None => return Err("spec missing".to_string()),
    };

    let template = match obj.get("template").filter(|v| is_truthy(v)) {
        Some(t) => t,
        None => return Err("template missing".to_string()),
    };

    if matches!(template.as_str(), Some("list" | "news" | "shopping")) {
        if !obj.get("itemSelector").is_some_and(is_truthy) {
            return Err("itemSelector missing".to_string());
        }
        if !obj.get("fields").is_some_and(|v| v.is_object()) {
            return Err("fields missing".to_string());
        }
    }

    Ok(())
}
