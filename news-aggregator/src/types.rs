use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One configured feed: an agency publishing for a country at a URL.
/// Identity is the (country, agency) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub country: String,
    pub agency: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(country: impl Into<String>, agency: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            agency: agency.into(),
            url: url.into(),
        }
    }
}

/// A normalized news article. Field names are the export column names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Article {
    pub country: String,
    pub news_agency: String,
    pub title: String,
    /// Source-provided date text, never parsed or validated.
    pub publication_date: String,
    pub summary: String,
    pub news_url: String,
    /// Detected language code, or `unknown` when there was no summary.
    pub language: String,
}

impl Article {
    /// Key used for deduplication: two articles with the same title and URL are the same article.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.title.as_str(), self.news_url.as_str())
    }
}

/// The result of one aggregation run. Shared read-only between consumers.
pub type ArticleSet = Arc<Vec<Article>>;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Minimum spacing between fetch starts, globally and per host.
    pub fetch_delay: Duration,
    pub max_concurrency: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-aggregator/0.1".to_string(),
            timeout_seconds: 10,
            max_retries: 0,
            retry_delay_seconds: 1,
            fetch_delay: Duration::from_secs(1),
            max_concurrency: 4,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Language detection failed: {0}")]
    Detection(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{format} export not found")]
    ExportNotFound { format: String },

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
