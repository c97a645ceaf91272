//! Environment-driven service configuration.

use std::path::PathBuf;

use crate::error::{AdapterError, Result};
use crate::refine::DEFAULT_MAX_ITERATIONS;

/// Default adapter TTL before background refresh: 6 hours.
const DEFAULT_TTL_MS: i64 = 6 * 60 * 60 * 1000;

/// Default markup byte budget handed to the generation client.
pub const DEFAULT_MAX_MARKUP_BYTES: usize = 200_000;

/// Tunables for the adapter service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backing file for the adapter store; `None` keeps it in memory.
    pub store_path: Option<PathBuf>,

    /// Age after which a stored adapter is due for background refresh.
    pub ttl: chrono::Duration,

    /// Markup truncation budget in bytes.
    pub max_markup_bytes: usize,

    /// Refinement iteration budget when the caller does not override it.
    pub max_iterations: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            ttl: chrono::Duration::milliseconds(DEFAULT_TTL_MS),
            max_markup_bytes: DEFAULT_MAX_MARKUP_BYTES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the environment, falling back to defaults
    /// for unset variables.
    ///
    /// Variables: `ADAPTER_STORE_PATH`, `ADAPTER_TTL_MS`,
    /// `ADAPTER_MAX_HTML_BYTES`, `ADAPTER_RECURSIVE_MAX_ITER`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ADAPTER_STORE_PATH") {
            if !path.is_empty() {
                config.store_path = Some(PathBuf::from(path));
            }
        }
        if let Some(ttl_ms) = parse_env::<i64>("ADAPTER_TTL_MS")? {
            config.ttl = chrono::Duration::milliseconds(ttl_ms);
        }
        if let Some(bytes) = parse_env::<usize>("ADAPTER_MAX_HTML_BYTES")? {
            config.max_markup_bytes = bytes;
        }
        if let Some(iterations) = parse_env::<u32>("ADAPTER_RECURSIVE_MAX_ITER")? {
            config.max_iterations = iterations;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| AdapterError::Config(format!("invalid {name}: {raw}"))),
        _ => Ok(None),
    }
}
