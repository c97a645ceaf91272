//! In-flight de-duplication of concurrent generation runs.
//!
//! Keyed by URL hostname so concurrent requests for the same host share a
//! single outstanding generation/refinement task instead of triggering
//! redundant model calls. The owning task removes its entry through a drop
//! guard, so a crashed or cancelled generation never permanently wedges
//! future requests for that host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;
use url::Url;

use crate::error::{AdapterError, Result};
use crate::types::spec::AdapterSpec;

type SharedGeneration = Shared<BoxFuture<'static, std::result::Result<AdapterSpec, Arc<AdapterError>>>>;

/// Map of outstanding generation tasks, keyed by hostname.
#[derive(Default)]
pub struct InflightMap {
    tasks: Mutex<HashMap<String, SharedGeneration>>,
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// De-duplication key for a URL: its hostname, or the whole string
    /// when it does not parse.
    pub fn dedup_key(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string())
    }

    /// Number of outstanding tasks.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `make()` under the given key, or join the task already running
    /// for it.
    ///
    /// The factory is only invoked when no task is outstanding for the
    /// key; joiners await the shared result. Errors are shared with every
    /// joiner via [`AdapterError::Shared`].
    pub async fn run<F>(&self, key: &str, make: F) -> Result<AdapterSpec>
    where
        F: FnOnce() -> BoxFuture<'static, Result<AdapterSpec>>,
    {
        let (shared, owned) = {
            let mut tasks = self.tasks.lock().unwrap();
            match tasks.get(key) {
                Some(existing) => {
                    debug!(key, "joining in-flight generation");
                    (existing.clone(), false)
                }
                None => {
                    let shared = make().map(|result| result.map_err(Arc::new)).boxed().shared();
                    tasks.insert(key.to_string(), shared.clone());
                    (shared, true)
                }
            }
        };

        if owned {
            // Guard removal so the entry is cleaned up even if this task
            // is cancelled mid-await.
            let _cleanup = CleanupGuard {
                tasks: &self.tasks,
                key: key.to_string(),
            };
            shared.await.map_err(AdapterError::Shared)
        } else {
            shared.await.map_err(AdapterError::Shared)
        }
    }
}

struct CleanupGuard<'a> {
    tasks: &'a Mutex<HashMap<String, SharedGeneration>>,
    key: String,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::types::spec::Template;

    fn make_spec(id: &str) -> AdapterSpec {
        let mut spec = AdapterSpec::new(Template::List);
        spec.id = Some(id.to_string());
        spec
    }

    #[test]
    fn test_dedup_key_prefers_hostname() {
        assert_eq!(
            InflightMap::dedup_key("https://shop.example/a/b?q=1"),
            "shop.example"
        );
        assert_eq!(InflightMap::dedup_key("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_task() {
        let map = Arc::new(InflightMap::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let factory = |invocations: Arc<AtomicUsize>| {
            move || {
                async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(make_spec("shared"))
                }
                .boxed()
            }
        };

        let (a, b) = tokio::join!(
            map.run("host", factory(invocations.clone())),
            map.run("host", factory(invocations.clone())),
        );

        assert_eq!(a.unwrap().id.as_deref(), Some("shared"));
        assert_eq!(b.unwrap().id.as_deref(), Some("shared"));
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_run_independently() {
        let map = InflightMap::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        for key in ["a.com", "b.com"] {
            let counter = invocations.clone();
            map.run(key, move || {
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(make_spec(key))
                }
                .boxed()
            })
            .await
            .unwrap();
        }

        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let map = InflightMap::new();
        map.run("host", || async { Ok(make_spec("x")) }.boxed())
            .await
            .unwrap();
        assert!(map.is_empty());

        // A later run for the same key starts a fresh task.
        let result = map
            .run("host", || async { Ok(make_spec("y")) }.boxed())
            .await
            .unwrap();
        assert_eq!(result.id.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_cleaned_up() {
        let map = Arc::new(InflightMap::new());

        let failing = || {
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(AdapterError::SpecParse)
            }
            .boxed()
        };

        let (a, b) = tokio::join!(map.run("host", failing), map.run("host", failing));
        assert!(a.is_err());
        assert!(b.is_err());
        // A crashed generation must not wedge future requests.
        assert!(map.is_empty());
    }
}
