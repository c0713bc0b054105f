use crate::parser::FeedParser;
use crate::rss_utils::url::extract_host;
use crate::traits::FeedFetcher;
use crate::types::{AggregatorError, Article, FeedSource, FetchConfig, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// HTTP feed fetcher. Every request is bounded by the configured timeout and
/// requests to the same host are spaced by at least `fetch_delay`.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    parser: FeedParser,
    rate_limiter: Arc<Mutex<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            parser: FeedParser::new(),
            rate_limiter: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch and parse one source, surfacing the failure cause.
    pub async fn try_fetch(&self, source: &FeedSource) -> Result<Vec<Article>> {
        let start_time = std::time::Instant::now();
        debug!("Fetching {} ({}): {}", source.agency, source.country, source.url);

        let content = self.fetch_with_retries(&source.url).await?;
        let articles = self.parser.parse_articles(source, &content)?;

        info!(
            "Fetched {} ({}): {} articles in {}ms",
            source.agency,
            source.country,
            articles.len(),
            start_time.elapsed().as_millis()
        );
        Ok(articles)
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Vec<u8>> {
        let retry_delay = Duration::from_secs(self.config.retry_delay_seconds);
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: retry_delay,
            initial_interval: retry_delay,
            max_interval: retry_delay * 32,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(content) => return Ok(content),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(retry_delay);
                    warn!("Attempt {} failed for {}: {}, retrying in {:?}", attempt, url, e, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        self.apply_rate_limit(url).await?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::Status { status: status.as_u16() });
        }

        let content = response.bytes().await?;
        Ok(content.to_vec())
    }

    /// Reserve the next request slot for the URL's host, then wait for it.
    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let host = extract_host(url)
            .ok_or_else(|| AggregatorError::General(format!("URL without host: {}", url)))?;
        let min_interval = self.config.fetch_delay;

        let slot = {
            let mut rate_limiter = self.rate_limiter.lock().await;
            let now = Instant::now();
            let slot = match rate_limiter.get(&host) {
                Some(last) => (*last + min_interval).max(now),
                None => now,
            };
            rate_limiter.insert(host.clone(), slot);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!("Rate limiting {}: waiting {:?}", host, wait);
            tokio::time::sleep_until(slot).await;
        }

        Ok(())
    }
}

#[async_trait]
impl FeedFetcher for Fetcher {
    async fn fetch(&self, source: &FeedSource) -> Vec<Article> {
        match self.try_fetch(source).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Failed to fetch {} ({}): {}", source.agency, source.country, e);
                Vec::new()
            }
        }
    }
}
