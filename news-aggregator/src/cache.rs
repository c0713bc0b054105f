use crate::aggregator::Aggregator;
use crate::export::ExportSink;
use crate::registry::SourceRegistry;
use crate::rss_utils::time::should_update;
use crate::types::ArticleSet;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Last completed aggregation. `fetched_at` is `None` until the first run finishes.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    pub articles: ArticleSet,
    pub fetched_at: Option<Instant>,
    pub fetched_at_utc: Option<DateTime<Utc>>,
}

/// Holds the last aggregation result and decides when to run a new one.
///
/// Readers share the current `ArticleSet` through an `Arc`, so a refresh swaps
/// the whole set at once. Callers that find the cache stale queue on
/// `refresh_gate`; the first one aggregates and the rest reuse its result.
pub struct CacheManager {
    registry: Arc<SourceRegistry>,
    aggregator: Aggregator,
    ttl: Duration,
    export: Option<Arc<ExportSink>>,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
}

impl CacheManager {
    pub fn new(registry: Arc<SourceRegistry>, aggregator: Aggregator, ttl: Duration) -> Self {
        Self {
            registry,
            aggregator,
            ttl,
            export: None,
            state: RwLock::new(CacheState::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Persist every new article set through `sink`.
    pub fn with_export(mut self, sink: Arc<ExportSink>) -> Self {
        self.export = Some(sink);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Current article set, aggregating first if the cache is stale.
    pub async fn get_current(&self) -> ArticleSet {
        if let Some(articles) = self.fresh_articles().await {
            debug!("Cache hit ({} articles)", articles.len());
            return articles;
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate
        if let Some(articles) = self.fresh_articles().await {
            debug!("Cache refreshed by a concurrent caller");
            return articles;
        }

        self.refresh_locked().await
    }

    /// Aggregate now regardless of freshness.
    pub async fn refresh(&self) -> ArticleSet {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Current state without triggering a fetch.
    pub async fn snapshot(&self) -> CacheState {
        self.state.read().await.clone()
    }

    async fn fresh_articles(&self) -> Option<ArticleSet> {
        let state = self.state.read().await;
        if should_update(state.fetched_at, self.ttl) {
            None
        } else {
            Some(state.articles.clone())
        }
    }

    async fn refresh_locked(&self) -> ArticleSet {
        info!("Cache stale, aggregating {} sources", self.registry.len());

        let articles: ArticleSet = Arc::new(self.aggregator.aggregate_all(&self.registry).await);

        if let Some(sink) = &self.export {
            if let Err(e) = sink.export(articles.clone()).await {
                error!("Failed to export {} articles: {}", articles.len(), e);
            }
        }

        let mut state = self.state.write().await;
        state.articles = articles.clone();
        state.fetched_at = Some(Instant::now());
        state.fetched_at_utc = Some(Utc::now());

        articles
    }
}
