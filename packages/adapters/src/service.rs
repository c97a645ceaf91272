//! The adapter service: a process-level facade tying together the store,
//! the generation client, the refinement loop, and the in-flight
//! de-duplication map.
//!
//! The service is an explicit context object passed by reference (or
//! cheaply cloned, since all state is behind `Arc`), never module-level
//! shared state, so multiple independent instances can coexist and tests
//! stay isolated.

use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{AdapterError, Result};
use crate::fetch::truncate_markup;
use crate::generate::SpecGenerator;
use crate::inflight::InflightMap;
use crate::prompts::GenerationContext;
use crate::refine::{refine_spec, RefineOptions, RefineOutcome};
use crate::store::AdapterStore;
use crate::traits::{fetcher::PageFetcher, model::LanguageModel};
use crate::types::spec::{AdapterSpec, Template};

/// A cache lookup result: the spec plus whether it is due for refresh.
#[derive(Debug, Clone)]
pub struct AdapterLookup {
    pub spec: AdapterSpec,
    /// True once `now - updatedAt` exceeds the configured TTL; the lookup
    /// itself never blocks on a refresh.
    pub stale: bool,
}

/// Facade over adapter lookup, generation, refinement, and storage.
pub struct AdapterService<M: LanguageModel + 'static, F: PageFetcher + 'static> {
    store: Arc<AdapterStore>,
    generator: Arc<SpecGenerator<M>>,
    fetcher: Arc<F>,
    inflight: Arc<InflightMap>,
    config: ServiceConfig,
}

impl<M: LanguageModel, F: PageFetcher> Clone for AdapterService<M, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            fetcher: Arc::clone(&self.fetcher),
            inflight: Arc::clone(&self.inflight),
            config: self.config.clone(),
        }
    }
}

impl<M: LanguageModel, F: PageFetcher> AdapterService<M, F> {
    /// Build a service; opens the file-backed store when the config names
    /// a path, else keeps everything in memory.
    pub fn new(model: M, fetcher: F, config: ServiceConfig) -> Self {
        let store = match &config.store_path {
            Some(path) => AdapterStore::open(path),
            None => AdapterStore::in_memory(),
        };
        Self {
            store: Arc::new(store),
            generator: Arc::new(SpecGenerator::new(model)),
            fetcher: Arc::new(fetcher),
            inflight: Arc::new(InflightMap::new()),
            config,
        }
    }

    pub fn store(&self) -> &AdapterStore {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Synchronous cache lookup with a staleness flag.
    pub fn lookup(
        &self,
        url: &str,
        template_hint: Option<&Template>,
    ) -> Result<Option<AdapterLookup>> {
        let parsed = Url::parse(url).map_err(|_| AdapterError::InvalidUrl {
            url: url.to_string(),
        })?;

        Ok(self.store.find(&parsed, template_hint).map(|spec| {
            info!(url, "adapter cache hit");
            let stale = AdapterStore::is_stale(&spec, self.config.ttl);
            AdapterLookup { spec, stale }
        }))
    }

    /// Return the stored adapter for a URL, generating one on a miss.
    ///
    /// A stale hit is returned immediately and refreshed in the
    /// background; a miss runs a full (de-duplicated) refinement and
    /// stores whatever it produces. Storage does not imply acceptance.
    pub async fn ensure_adapter(
        &self,
        url: &str,
        template_hint: Option<&Template>,
    ) -> Result<AdapterSpec> {
        if let Some(found) = self.lookup(url, template_hint)? {
            if found.stale {
                let service = self.clone();
                let refresh_url = url.to_string();
                tokio::spawn(async move {
                    if let Err(err) = service.generate_and_store(&refresh_url, None).await {
                        warn!(url = %refresh_url, error = %err, "background refresh failed");
                    }
                });
            }
            return Ok(found.spec);
        }

        info!(url, "adapter cache miss");
        let options = RefineOptions {
            template_hint: template_hint.cloned(),
            ..Default::default()
        };
        self.refine_and_store(url, None, options).await
    }

    /// Single-pass generation, de-duplicated per host, result stored.
    pub async fn generate_and_store(
        &self,
        url: &str,
        markup_override: Option<String>,
    ) -> Result<AdapterSpec> {
        let key = InflightMap::dedup_key(url);
        let service = self.clone();
        let url = url.to_string();

        self.inflight
            .run(&key, move || {
                async move {
                    info!(url = %url, "generating adapter (single pass)");
                    let markup = service.markup_for(&url, markup_override).await?;
                    let spec = service
                        .generator
                        .generate(&url, &markup, &GenerationContext::default())
                        .await?;
                    Ok(service.store.upsert(spec))
                }
                .boxed()
            })
            .await
    }

    /// Full refinement run, de-duplicated per host, final candidate
    /// stored whether or not it was accepted.
    pub async fn refine_and_store(
        &self,
        url: &str,
        markup_override: Option<String>,
        options: RefineOptions,
    ) -> Result<AdapterSpec> {
        let key = InflightMap::dedup_key(url);
        let service = self.clone();
        let url = url.to_string();

        self.inflight
            .run(&key, move || {
                async move {
                    info!(url = %url, "generating adapter (recursive)");
                    let outcome = service.run_refinement(&url, markup_override, options).await?;
                    Ok(outcome.spec)
                }
                .boxed()
            })
            .await
    }

    /// Refinement without de-duplication, returning the full outcome
    /// (stored spec, report, iteration count) for callers that surface
    /// the diagnostics.
    pub async fn refine(
        &self,
        url: &str,
        markup_override: Option<String>,
        options: RefineOptions,
    ) -> Result<RefineOutcome> {
        self.run_refinement(url, markup_override, options).await
    }

    async fn run_refinement(
        &self,
        url: &str,
        markup_override: Option<String>,
        mut options: RefineOptions,
    ) -> Result<RefineOutcome> {
        let markup = self.markup_for(url, markup_override).await?;
        options.max_iterations =
            Some(options.max_iterations.unwrap_or(self.config.max_iterations));

        let outcome = refine_spec(self.generator.as_ref(), url, &markup, &options).await?;
        info!(
            url,
            iterations = outcome.iterations,
            ok = outcome.report.ok,
            "recursive generation done"
        );

        let stored = self.store.upsert(outcome.spec);
        Ok(RefineOutcome {
            spec: stored,
            report: outcome.report,
            iterations: outcome.iterations,
        })
    }

    async fn markup_for(&self, url: &str, markup_override: Option<String>) -> Result<String> {
        let raw = match markup_override {
            Some(markup) => markup,
            None => self.fetcher.fetch(url).await?,
        };
        Ok(truncate_markup(&raw, self.config.max_markup_bytes).to_string())
    }
}
