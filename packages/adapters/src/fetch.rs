//! HTTP page fetching.

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::fetcher::PageFetcher;

/// Browser-like User-Agent; many sites refuse default client agents.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Fetches raw page HTML over HTTP with reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|err| AdapterError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!(url, "fetching page markup");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AdapterError::Fetch {
                url: url.to_string(),
                source: err.into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Fetch {
                url: url.to_string(),
                source: format!("unexpected status {status}").into(),
            });
        }

        response.text().await.map_err(|err| AdapterError::Fetch {
            url: url.to_string(),
            source: err.into(),
        })
    }
}

/// Truncate markup to a byte budget, backing off to a char boundary.
pub fn truncate_markup(markup: &str, max_bytes: usize) -> &str {
    if markup.len() <= max_bytes {
        return markup;
    }
    let mut end = max_bytes;
    while end > 0 && !markup.is_char_boundary(end) {
        end -= 1;
    }
    &markup[..end]
}
