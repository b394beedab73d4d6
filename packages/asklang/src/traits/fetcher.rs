//! Page fetcher trait used by the summarization path.

use async_trait::async_trait;

use crate::error::CollaboratorResult;

/// Fetch a single page and return its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> CollaboratorResult<String>;
}
