use crate::rss_utils::url::is_valid_feed_url;
use crate::types::{AggregatorError, FeedSource, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Built-in feeds, one agency per country, in enumeration order.
const DEFAULT_FEEDS: &[(&str, &str, &str)] = &[
    ("UK", "BBC", "http://feeds.bbci.co.uk/news/rss.xml"),
    ("USA", "CNN", "http://rss.cnn.com/rss/edition.rss"),
    ("India", "The Hindu", "https://www.thehindu.com/news/national/feeder/default.rss"),
    ("Japan", "NHK", "https://www3.nhk.or.jp/rss/news/cat0.xml"),
    ("Germany", "DW", "https://rss.dw.com/rdf/rss-en-all"),
    ("China", "Xinhua", "http://www.xinhuanet.com/english/rss/worldrss.xml"),
    ("Australia", "ABC", "https://www.abc.net.au/news/feed/51120/rss.xml"),
    ("South Korea", "KBS", "https://world.kbs.co.kr/rss/rss_news.htm?lang=e"),
    ("Russia", "RT", "https://www.rt.com/rss/news/"),
    ("Italy", "ANSA", "https://www.ansa.it/sito/ansait_rss.xml"),
    ("Spain", "El Pais", "https://feeds.elpais.com/mrss-s/pages/ep/site/elpais.com/portada"),
    ("France", "Le Monde", "https://www.lemonde.fr/rss/une.xml"),
    ("Canada", "Global News", "https://globalnews.ca/feed/"),
    ("Brazil", "Estadao", "https://www.estadao.com.br/rss/ultimas.xml"),
    ("Mexico", "Proceso", "https://www.proceso.com.mx/feed"),
    ("South Africa", "IOL", "https://www.iol.co.za/cmlink/1.640"),
    ("Singapore", "Straits Times", "https://www.straitstimes.com/news/world/rss.xml"),
    ("Indonesia", "Kompas", "https://indeks.kompas.com/headline.rss"),
    ("Malaysia", "The Star", "https://www.thestar.com.my/rss/editors-choice"),
    ("UAE", "Gulf News", "https://gulfnews.com/rss?generatorName=RSS-Feeds"),
    ("Pakistan", "Dawn", "https://www.dawn.com/feeds/home"),
    ("Bangladesh", "BDNews24", "https://bangla.bdnews24.com/rss.xml"),
    ("Thailand", "Bangkok Post", "https://www.bangkokpost.com/rss/data/topstories.xml"),
    ("New Zealand", "NZ Herald", "https://www.nzherald.co.nz/rss"),
    ("Philippines", "PhilStar", "https://www.philstar.com/rss/headlines"),
];

/// Static, read-only set of feed sources grouped by country.
///
/// Enumeration order is the configuration order; it decides which article
/// wins when two sources publish the same (title, url) pair.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<FeedSource>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "feed")]
    feeds: Vec<FeedSource>,
}

impl SourceRegistry {
    /// Build a registry, rejecting empty fields, non-HTTP URLs and repeated (country, agency) pairs.
    pub fn new(sources: Vec<FeedSource>) -> Result<Self> {
        let mut seen = HashSet::new();

        for source in &sources {
            if source.country.trim().is_empty() || source.agency.trim().is_empty() {
                return Err(AggregatorError::Config(format!(
                    "feed with url '{}' has an empty country or agency",
                    source.url
                )));
            }
            if !is_valid_feed_url(&source.url) {
                return Err(AggregatorError::Config(format!(
                    "invalid feed url for {} ({}): '{}'",
                    source.agency, source.country, source.url
                )));
            }
            if !seen.insert((source.country.as_str(), source.agency.as_str())) {
                return Err(AggregatorError::Config(format!(
                    "duplicate feed for {} ({})",
                    source.agency, source.country
                )));
            }
        }

        Ok(Self { sources })
    }

    pub fn builtin() -> Self {
        let sources = DEFAULT_FEEDS
            .iter()
            .map(|(country, agency, url)| FeedSource::new(*country, *agency, *url))
            .collect();
        Self { sources }
    }

    /// Parse a TOML document made of `[[feed]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content)
            .map_err(|e| AggregatorError::Config(format!("invalid feed registry: {}", e)))?;
        Self::new(file.feeds)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&content)?;
        info!("Loaded {} feeds from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    /// Distinct countries in first-seen order.
    pub fn countries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .map(|s| s.country.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
