pub mod types;
pub mod rss_utils;
pub mod registry;
pub mod traits;
pub mod parser;
pub mod fetcher;
pub mod aggregator;
pub mod cache;
pub mod query;
pub mod export;
pub mod config;
pub mod api;

pub use types::*;
pub use registry::SourceRegistry;
pub use traits::FeedFetcher;
pub use parser::FeedParser;
pub use fetcher::Fetcher;
pub use aggregator::{dedup_articles, Aggregator};
pub use cache::{CacheManager, CacheState};
pub use query::{query, NewsQuery, PagedResult, QueryError};
pub use export::{ExportFormat, ExportSink};
pub use api::{create_router, AppState};
