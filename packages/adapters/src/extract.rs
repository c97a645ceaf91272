//! Deterministic field extraction from parsed markup.
//!
//! Every fallible micro-step here (selector parse, selector match, regex
//! compile, URL resolution) degrades to the next most useful value instead
//! of erroring: one bad field rule must not poison the other fields or
//! abort the whole item.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::spec::{FieldRule, ValueSource, REGEX_SIZE_LIMIT};

/// Extract one named value from a scope node.
///
/// Returns `None` when the rule's selector matches nothing or the final
/// value is empty; never panics or errors.
pub fn extract_field(
    scope: ElementRef<'_>,
    rule: &FieldRule,
    field_name: &str,
    base_url: &Url,
) -> Option<String> {
    let view = rule.view();

    let node = match view.selector {
        Some(raw) => {
            // An unparsable selector behaves like a selector with no match.
            let selector = Selector::parse(raw).ok()?;
            scope.select(&selector).next()?
        }
        None => scope,
    };

    let raw = match view.attr {
        Some(attr) => node.value().attr(attr)?.to_string(),
        None => match view.source {
            ValueSource::Html => node.inner_html(),
            ValueSource::Text => node.text().collect::<String>(),
        },
    };
    if raw.is_empty() {
        return None;
    }

    let mut value = raw.trim().to_string();

    if let Some(pattern) = view.regex {
        value = apply_regex_filter(value, pattern);
    }

    let resolve = view
        .absolute
        .unwrap_or(field_name == "href" || field_name == "image");
    if resolve {
        // An unresolvable value passes through unchanged.
        if let Ok(absolute) = base_url.join(&value) {
            value = absolute.to_string();
        }
    }

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Apply a model-supplied capture-group filter.
///
/// On a match, capture group 1 wins when present and non-empty, else the
/// full match. Compile and match failures keep the value unchanged.
fn apply_regex_filter(value: String, pattern: &str) -> String {
    let compiled = RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build();
    let re = match compiled {
        Ok(re) => re,
        Err(_) => return value,
    };

    match re.captures(&value) {
        Some(caps) => {
            let group = caps
                .get(1)
                .filter(|m| !m.as_str().is_empty())
                .or_else(|| caps.get(0));
            match group {
                Some(m) => m.as_str().to_string(),
                None => value,
            }
        }
        None => value,
    }
}

/// Extract all item field maps for an item-template spec.
///
/// Returns `None` when the item selector itself does not parse; each item
/// map holds only the fields that produced a value.
pub fn extract_items(
    doc: &Html,
    item_selector: &str,
    fields: &IndexMap<String, FieldRule>,
    base_url: &Url,
) -> Option<Vec<IndexMap<String, String>>> {
    let selector = Selector::parse(item_selector).ok()?;

    let items = doc
        .select(&selector)
        .map(|node| {
            let mut data = IndexMap::new();
            for (name, rule) in fields {
                if let Some(value) = extract_field(node, rule, name, base_url) {
                    data.insert(name.clone(), value);
                }
            }
            data
        })
        .collect();

    Some(items)
}

/// Extract article content from the document root and flatten it to plain
/// text.
pub fn extract_content(doc: &Html, rule: Option<&FieldRule>, base_url: &Url) -> String {
    let content = rule
        .and_then(|r| extract_field(doc.root_element(), r, "content", base_url))
        .unwrap_or_default();
    strip_tags(&content)
}

/// Strip markup tags, leaving trimmed plain text.
pub(crate) fn strip_tags(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern"));
    re.replace_all(html, "").trim().to_string()
}
