/// Feed-specific utility functions shared by the registry, fetcher and cache

/// URL utilities for feed sources
pub mod url {
    use url::Url;

    /// Extract the host of a URL, used as the per-origin pacing key
    pub fn extract_host(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some(),
            Err(_) => false,
        }
    }
}

/// Time utilities for cache freshness
pub mod time {
    use std::time::Duration;
    use tokio::time::Instant;

    /// True when nothing was fetched yet or more than `ttl` has passed since the last fetch.
    /// Exactly `ttl` old still counts as fresh.
    pub fn should_update(last_update: Option<Instant>, ttl: Duration) -> bool {
        match last_update {
            None => true,
            Some(last) => Instant::now().saturating_duration_since(last) > ttl,
        }
    }
}
