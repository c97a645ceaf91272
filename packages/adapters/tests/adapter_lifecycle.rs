//! Integration tests for the full adapter lifecycle.
//!
//! These tests verify the complete workflow:
//! 1. Generate a candidate spec from page markup
//! 2. Evaluate it against the page
//! 3. Feed rejection diagnostics back and regenerate
//! 4. Store the result and serve later lookups from the cache

use adapters::{
    AdapterService, Criteria, EvaluateOptions, MockFetcher, MockModel, RefineOptions,
    ServiceConfig, Template,
};

/// A shopping listing where every row has a title, a relative link, and a
/// dollar price.
fn shopping_markup(rows: usize) -> String {
    let mut out = String::from("<html><body><div id=\"grid\">");
    for i in 0..rows {
        out.push_str(&format!(
            "<div class=\"product\">\
               <h2 class=\"name\">Product {i}</h2>\
               <a class=\"link\" href=\"/p/{i}\">view</a>\
               <span class=\"cost\">Now: ${i}.50</span>\
             </div>"
        ));
    }
    out.push_str("</div></body></html>");
    out
}

/// A spec whose item selector matches nothing on the shopping page.
const MISSES_EVERYTHING: &str = r#"{
    "id": "shop-example",
    "template": "shopping",
    "match": { "hostContains": ["shop.example"] },
    "itemSelector": ".card",
    "fields": {
        "title": "h2",
        "href": {"selector": "a", "attr": "href"},
        "price": ".cost"
    }
}"#;

/// A correct spec: right selector, regex-filtered price, link via attr.
const MATCHES_GRID: &str = r#"{
    "id": "shop-example",
    "template": "shopping",
    "match": { "hostContains": ["shop.example"] },
    "itemSelector": ".product",
    "fields": {
        "title": ".name",
        "href": {"selector": "a.link", "attr": "href"},
        "price": {"selector": ".cost", "regex": "\\$([0-9.]+)"}
    }
}"#;

fn service_with(model: MockModel, markup: &str) -> AdapterService<MockModel, MockFetcher> {
    AdapterService::new(
        model,
        MockFetcher::new().with_fallback(markup),
        ServiceConfig::default(),
    )
}

#[tokio::test]
async fn test_rejection_feedback_drives_a_successful_retry() {
    let markup = shopping_markup(8);
    let model = MockModel::new()
        .with_response(MISSES_EVERYTHING)
        .with_response(MATCHES_GRID);
    let service = service_with(model, &markup);

    let outcome = service
        .refine(
            "https://shop.example/catalog",
            None,
            RefineOptions::default(),
        )
        .await
        .unwrap();

    assert!(outcome.report.ok, "issues: {:?}", outcome.report.issues);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.spec.item_selector.as_deref(), Some(".product"));
    assert_eq!(outcome.report.count("items"), Some(8.0));
    assert_eq!(outcome.report.count("priceRate"), Some(1.0));
}

#[tokio::test]
async fn test_refined_spec_serves_later_lookups_from_cache() {
    let markup = shopping_markup(8);
    let service = service_with(MockModel::new().with_response(MATCHES_GRID), &markup);

    let generated = service
        .ensure_adapter("https://shop.example/catalog", None)
        .await
        .unwrap();
    assert_eq!(generated.id.as_deref(), Some("shop-example"));

    // A different path on the same host hits the stored spec.
    let found = service
        .lookup("https://shop.example/sale?page=2", None)
        .unwrap()
        .expect("cached adapter");
    assert_eq!(found.spec.id.as_deref(), Some("shop-example"));
    assert!(!found.stale);

    // Another host does not.
    assert!(service.lookup("https://other.example/", None).unwrap().is_none());
}

#[tokio::test]
async fn test_template_hint_filters_cache_lookups() {
    let markup = shopping_markup(8);
    let service = service_with(MockModel::new().with_response(MATCHES_GRID), &markup);

    service
        .ensure_adapter("https://shop.example/catalog", None)
        .await
        .unwrap();

    let hit = service
        .lookup("https://shop.example/catalog", Some(&Template::Shopping))
        .unwrap();
    assert!(hit.is_some());

    let miss = service
        .lookup("https://shop.example/catalog", Some(&Template::Article))
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_store_survives_service_restart() {
    let markup = shopping_markup(8);
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        store_path: Some(dir.path().join("adapters.json")),
        ..Default::default()
    };

    {
        let service = AdapterService::new(
            MockModel::new().with_response(MATCHES_GRID),
            MockFetcher::new().with_fallback(&markup),
            config.clone(),
        );
        service
            .ensure_adapter("https://shop.example/catalog", None)
            .await
            .unwrap();
    }

    // A fresh service over the same file needs no model call.
    let reopened = AdapterService::new(
        MockModel::new(),
        MockFetcher::new().with_fallback(&markup),
        config,
    );
    let found = reopened
        .lookup("https://shop.example/catalog", None)
        .unwrap()
        .expect("persisted adapter");
    assert_eq!(found.spec.id.as_deref(), Some("shop-example"));
    assert_eq!(found.spec.template, Template::Shopping);
}

#[tokio::test]
async fn test_exhausted_refinement_reports_and_stores_the_failure() {
    let markup = shopping_markup(8);
    let model = MockModel::new()
        .with_response(MISSES_EVERYTHING)
        .with_response(MISSES_EVERYTHING);
    let service = service_with(model, &markup);

    let outcome = service
        .refine(
            "https://shop.example/catalog",
            None,
            RefineOptions {
                max_iterations: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!outcome.report.ok);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome
        .report
        .issues
        .iter()
        .any(|i| i == "found 0 items (< 6)"));
    // The failing candidate is stored anyway, stamped for staleness.
    assert_eq!(service.store().len(), 1);
    assert!(outcome.spec.updated_at.is_some());
}

#[tokio::test]
async fn test_caller_criteria_thread_through_the_whole_run() {
    // Only 5 rows: default minItems of 6 would reject, the override accepts.
    let markup = shopping_markup(5);
    let service = service_with(MockModel::new().with_response(MATCHES_GRID), &markup);

    let criteria = Criteria {
        min_items: Some(5),
        ..Default::default()
    };
    let outcome = service
        .refine(
            "https://shop.example/catalog",
            None,
            RefineOptions {
                criteria: Some(criteria),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.report.ok, "issues: {:?}", outcome.report.issues);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.report.count("items"), Some(5.0));
}

#[tokio::test]
async fn test_evaluate_options_report_shape() {
    // Direct evaluation of a stored-shape spec, outside the service.
    let markup = shopping_markup(10);
    let spec: adapters::AdapterSpec = serde_json::from_str(MATCHES_GRID).unwrap();

    let report = adapters::evaluate_spec(
        &spec,
        &markup,
        &EvaluateOptions {
            url: Some("https://shop.example/catalog"),
            ..Default::default()
        },
    );

    assert!(report.ok, "issues: {:?}", report.issues);
    assert_eq!(report.template, Template::Shopping);
    assert_eq!(report.count("items"), Some(10.0));
    assert_eq!(report.count("titleRate"), Some(1.0));
    assert_eq!(report.count("hrefRate"), Some(1.0));
    assert_eq!(report.count("priceRate"), Some(1.0));
    assert!(report.issues.is_empty());

    // The report round-trips as camelCase JSON for prompt feedback.
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"ok\":true"));
    assert!(json.contains("\"titleRate\""));
}
