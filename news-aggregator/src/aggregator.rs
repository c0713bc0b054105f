use crate::registry::SourceRegistry;
use crate::traits::FeedFetcher;
use crate::types::{Article, FetchConfig};
use futures::stream::{self, StreamExt};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Drives the fetcher over every source of a registry and merges the results.
///
/// Up to `max_concurrency` fetches are in flight at once, but fetch starts are
/// paced `fetch_delay` apart, so the request rate never exceeds a sequential
/// sweep with a fixed pause between sources.
pub struct Aggregator {
    fetcher: Arc<dyn FeedFetcher>,
    fetch_delay: Duration,
    max_concurrency: usize,
}

impl Aggregator {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, fetch_delay: Duration, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            fetch_delay,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(fetcher: Arc<dyn FeedFetcher>, config: &FetchConfig) -> Self {
        Self::new(fetcher, config.fetch_delay, config.max_concurrency)
    }

    /// Run one aggregation: fetch every source, flatten in registry order, deduplicate.
    /// Cannot fail; a failing source simply contributes nothing.
    pub async fn aggregate_all(&self, registry: &SourceRegistry) -> Vec<Article> {
        let start_time = Instant::now();
        let pacer = self.pacer();
        let pacer = pacer.as_ref();

        // Futures are collected first; the stream must not hold a closure over `registry`
        let fetches: Vec<_> = registry
            .iter()
            .map(|source| async move {
                if let Some(pacer) = pacer {
                    pacer.lock().await.tick().await;
                }
                debug!("Dispatching fetch for {} ({})", source.agency, source.country);
                self.fetcher.fetch(source).await
            })
            .collect();

        let per_source: Vec<Vec<Article>> = stream::iter(fetches)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let raw: Vec<Article> = per_source.into_iter().flatten().collect();
        let raw_count = raw.len();
        let articles = dedup_articles(raw);

        info!(
            "Aggregated {} sources: {} articles, {} after deduplication ({}ms)",
            registry.len(),
            raw_count,
            articles.len(),
            start_time.elapsed().as_millis()
        );

        articles
    }

    fn pacer(&self) -> Option<Mutex<Interval>> {
        if self.fetch_delay.is_zero() {
            return None;
        }
        let mut ticker = interval(self.fetch_delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(Mutex::new(ticker))
    }
}

/// Deduplicate on (title, news_url). A later article replaces an earlier one
/// with the same key but keeps the position where the key was first seen.
pub fn dedup_articles(articles: Vec<Article>) -> Vec<Article> {
    let total = articles.len();
    let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(articles.len());
    let mut unique: Vec<Article> = Vec::with_capacity(articles.len());

    for article in articles {
        let key = (article.title.clone(), article.news_url.clone());
        match index.entry(key) {
            Entry::Occupied(slot) => {
                unique[*slot.get()] = article;
            }
            Entry::Vacant(slot) => {
                slot.insert(unique.len());
                unique.push(article);
            }
        }
    }

    let removed_count = total - unique.len();
    if removed_count > 0 {
        debug!("Removed {} duplicate articles", removed_count);
    }

    unique
}
