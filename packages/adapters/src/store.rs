//! The adapter store: canonical persisted copies of accepted specs.
//!
//! In-memory list with optional JSON-file persistence. The on-disk layout
//! is a flat `{ "adapters": [...] }` document; there are no schema
//! migrations. Persistence failures are logged and never fatal: the
//! in-memory copy stays authoritative for the process lifetime.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use crate::types::spec::{AdapterSpec, Template};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    adapters: Vec<AdapterSpec>,
}

/// Flat collection of adapter specs, keyed logically by `id`.
///
/// An explicit instance owned by the process entry point; accessed
/// concurrently behind an `RwLock`, never as module-level shared state.
pub struct AdapterStore {
    path: Option<PathBuf>,
    adapters: RwLock<Vec<AdapterSpec>>,
}

impl AdapterStore {
    /// Create a store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            adapters: RwLock::new(Vec::new()),
        }
    }

    /// Open (or create) a file-backed store.
    ///
    /// A missing file is created empty; an unreadable or unparsable file
    /// is logged and treated as empty rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let adapters = match load_store_file(&path) {
            Ok(adapters) => {
                info!(path = %path.display(), count = adapters.len(), "loaded adapter store");
                adapters
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to load adapter store");
                Vec::new()
            }
        };

        Self {
            path: Some(path),
            adapters: RwLock::new(adapters),
        }
    }

    /// Number of stored specs.
    pub fn len(&self) -> usize {
        self.adapters.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored spec.
    pub fn all(&self) -> Vec<AdapterSpec> {
        self.adapters.read().unwrap().clone()
    }

    /// Find the best stored spec for a URL.
    ///
    /// Filters by each spec's match rule, then by template hint
    /// (case-insensitive) when given, and picks the most recently updated
    /// of the remaining candidates.
    pub fn find(&self, url: &Url, template_hint: Option<&Template>) -> Option<AdapterSpec> {
        let adapters = self.adapters.read().unwrap();

        adapters
            .iter()
            .filter(|spec| {
                spec.match_rule
                    .as_ref()
                    .map(|rule| rule.matches(url))
                    .unwrap_or(true)
            })
            .filter(|spec| match template_hint {
                Some(hint) => spec
                    .template
                    .to_string()
                    .eq_ignore_ascii_case(&hint.to_string()),
                None => true,
            })
            // min_by_key keeps the first of equal keys, so timestamp ties
            // resolve to the earliest-stored spec.
            .min_by_key(|spec| std::cmp::Reverse(updated_at_or_epoch(spec)))
            .cloned()
    }

    /// Insert or replace a spec, stamping `updatedAt`.
    ///
    /// Replaces an existing entry with the same `id`; specs without an id
    /// are always appended. Returns the stored (stamped) spec.
    pub fn upsert(&self, spec: AdapterSpec) -> AdapterSpec {
        let mut entry = spec;
        entry.updated_at = Some(Utc::now());

        let snapshot = {
            let mut adapters = self.adapters.write().unwrap();
            let position = entry.id.as_ref().and_then(|id| {
                adapters
                    .iter()
                    .position(|existing| existing.id.as_deref() == Some(id))
            });
            match position {
                Some(idx) => adapters[idx] = entry.clone(),
                None => adapters.push(entry.clone()),
            }
            adapters.clone()
        };

        self.persist(&snapshot);
        info!(
            id = entry.id.as_deref().unwrap_or("unknown"),
            template = %entry.template,
            "stored adapter"
        );
        entry
    }

    /// Whether a spec's `updatedAt` is older than the TTL.
    ///
    /// Specs without a timestamp are never considered stale; they predate
    /// TTL stamping and refresh on the next explicit write.
    pub fn is_stale(spec: &AdapterSpec, ttl: chrono::Duration) -> bool {
        match spec.updated_at {
            Some(updated_at) => Utc::now() - updated_at > ttl,
            None => false,
        }
    }

    fn persist(&self, adapters: &[AdapterSpec]) {
        let path = match &self.path {
            Some(path) => path,
            None => return,
        };

        let file = StoreFile {
            adapters: adapters.to_vec(),
        };
        let result = serde_json::to_string_pretty(&file)
            .map_err(|err| err.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|err| err.to_string()));
        if let Err(err) = result {
            error!(path = %path.display(), error = %err, "failed to save adapter store");
        }
    }
}

fn load_store_file(path: &Path) -> Result<Vec<AdapterSpec>, String> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let empty = serde_json::to_string_pretty(&StoreFile::default())
            .map_err(|err| err.to_string())?;
        std::fs::write(path, empty).map_err(|err| err.to_string())?;
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let file: StoreFile = serde_json::from_str(&raw).map_err(|err| err.to_string())?;
    Ok(file.adapters)
}

fn updated_at_or_epoch(spec: &AdapterSpec) -> DateTime<Utc> {
    spec.updated_at.unwrap_or(DateTime::UNIX_EPOCH)
}
