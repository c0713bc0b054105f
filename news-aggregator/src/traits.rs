use crate::types::{Article, FeedSource};
use async_trait::async_trait;

/// Retrieves the articles of one feed source.
///
/// Implementations never fail: a source that cannot be fetched or parsed
/// contributes zero articles, and the cause is logged where it happened.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Vec<Article>;
}
