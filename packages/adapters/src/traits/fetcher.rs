//! Page fetch abstraction.

use async_trait::async_trait;

use crate::error::Result;

/// Fetches a page's raw HTML.
///
/// Implementations return the full response body; the service layer
/// truncates to its markup byte budget afterwards.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}
