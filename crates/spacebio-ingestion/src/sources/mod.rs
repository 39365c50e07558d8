//! Article source clients.

pub mod pmc;

use async_trait::async_trait;
use crate::error::Result;
use crate::models::ArticleMetadata;

/// Common interface for anything that can turn an article URL into metadata.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch and parse the landing page at `url`.
    async fn fetch_article(&self, url: &str) -> Result<ArticleMetadata>;
}
