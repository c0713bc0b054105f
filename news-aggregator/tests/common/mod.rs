#![allow(dead_code)]

use async_trait::async_trait;
use news_aggregator::{Article, FeedFetcher, FeedSource, SourceRegistry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tokio::time::Instant;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn article(source: &FeedSource, title: &str, url: &str) -> Article {
    Article {
        country: source.country.clone(),
        news_agency: source.agency.clone(),
        title: title.to_string(),
        publication_date: "Mon, 09 Jun 2025 08:00:00 +0000".to_string(),
        summary: format!("Summary of {}", title),
        news_url: url.to_string(),
        language: "en".to_string(),
    }
}

/// `count` distinct articles for `source`.
pub fn articles_for(source: &FeedSource, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| {
            article(
                source,
                &format!("{} story {}", source.agency, i),
                &format!("{}/story/{}", source.url, i),
            )
        })
        .collect()
}

pub fn registry(sources: &[FeedSource]) -> SourceRegistry {
    SourceRegistry::new(sources.to_vec()).expect("valid test registry")
}

/// In-memory fetcher keyed by feed URL. Unknown URLs behave like dead feeds.
#[derive(Default)]
pub struct MockFetcher {
    feeds: HashMap<String, Vec<Article>>,
    delay: Duration,
    calls: AtomicUsize,
    started: Mutex<Vec<Instant>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, source: &FeedSource, articles: Vec<Article>) -> Self {
        self.feeds.insert(source.url.clone(), articles);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn start_times(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, source: &FeedSource) -> Vec<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.feeds.get(&source.url).cloned().unwrap_or_default()
    }
}
