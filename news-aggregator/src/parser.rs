use crate::types::{AggregatorError, Article, FeedSource, Result, UNKNOWN_LANGUAGE};
use feed_rs::model::Link;
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

/// Raw fields extracted from one feed entry. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntry {
    pub title: String,
    pub summary: String,
    pub published: String,
    pub link: String,
}

#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS 0.9x/1.0/2.0, Atom or JSON Feed document.
    ///
    /// Publication dates are taken verbatim from the document. feed-rs only
    /// keeps the timestamps it manages to parse, so the date text is read in a
    /// separate pass over the XML.
    pub fn parse_feed(&self, content: &[u8]) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut raw_dates = raw_entry_dates(content)
            .filter(|dates| dates.len() == feed.entries.len())
            .map(Vec::into_iter);
        if raw_dates.is_none() {
            debug!("No raw entry dates, using parsed timestamps");
        }

        let title = feed.title.map(|t| t.content);
        let entries = feed
            .entries
            .into_iter()
            .map(|entry| {
                let published = match raw_dates.as_mut() {
                    Some(dates) => dates.next().unwrap_or_default(),
                    None => entry.published.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
                };
                Self::parse_entry(entry, published)
            })
            .collect();

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry, published: String) -> ParsedEntry {
        let title = entry.title.map(|t| t.content).unwrap_or_default();

        // Prefer the summary, fall back to inline content
        let summary = match entry.summary {
            Some(summary) => summary.content,
            None => entry.content.and_then(|c| c.body).unwrap_or_default(),
        };

        ParsedEntry {
            title,
            summary,
            published,
            link: preferred_link(entry.links),
        }
    }

    /// Turn parsed entries into articles for `source`.
    /// Entries whose language cannot be detected are logged and skipped.
    pub fn to_articles(&self, source: &FeedSource, feed: ParsedFeed) -> Vec<Article> {
        let mut articles = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            match detect_language(&entry.summary) {
                Ok(language) => articles.push(Article {
                    country: source.country.clone(),
                    news_agency: source.agency.clone(),
                    title: entry.title,
                    publication_date: entry.published,
                    summary: entry.summary,
                    news_url: entry.link,
                    language,
                }),
                Err(e) => {
                    warn!(
                        "Error parsing article from {} ({}): {}",
                        source.agency, source.country, e
                    );
                }
            }
        }

        articles
    }

    pub fn parse_articles(&self, source: &FeedSource, content: &[u8]) -> Result<Vec<Article>> {
        let feed = self.parse_feed(content)?;
        Ok(self.to_articles(source, feed))
    }
}

/// The `alternate` (or rel-less) link, else the first one.
fn preferred_link(links: Vec<Link>) -> String {
    let position = links
        .iter()
        .position(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .unwrap_or(0);
    links
        .into_iter()
        .nth(position)
        .map(|l| l.href)
        .unwrap_or_default()
}

/// Rank of an entry child element that carries the publication date; lower wins.
fn date_rank(name: &[u8], local_name: &[u8]) -> Option<usize> {
    match (name, local_name) {
        (_, b"pubDate") => Some(0),
        (_, b"published") => Some(1),
        (b"dc:date", _) => Some(2),
        (_, b"issued") => Some(3),
        _ => None,
    }
}

fn is_entry(local_name: &[u8]) -> bool {
    local_name == b"item" || local_name == b"entry"
}

/// Publication date text of every `<item>`/`<entry>`, in document order.
/// Returns `None` when the document is not readable as XML.
fn raw_entry_dates(content: &[u8]) -> Option<Vec<String>> {
    let mut reader = Reader::from_reader(content);
    let mut dates: Vec<Option<(usize, String)>> = Vec::new();
    let mut depth = 0usize;
    let mut entry_depth: Option<usize> = None;
    let mut reading: Option<usize> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                match entry_depth {
                    None if is_entry(e.local_name().as_ref()) => {
                        entry_depth = Some(depth);
                        dates.push(None);
                    }
                    Some(d) if depth == d + 1 => {
                        reading = date_rank(e.name().as_ref(), e.local_name().as_ref());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if entry_depth.is_none() && is_entry(e.local_name().as_ref()) {
                    dates.push(None);
                }
            }
            Ok(Event::Text(t)) if reading.is_some() => {
                text.push_str(&t.unescape().ok()?);
            }
            Ok(Event::CData(c)) if reading.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(_)) => {
                if let (Some(rank), Some(d)) = (reading, entry_depth) {
                    if depth == d + 1 {
                        if let Some(slot) = dates.last_mut() {
                            if slot.as_ref().map_or(true, |(best, _)| rank < *best) {
                                *slot = Some((rank, text.trim().to_string()));
                            }
                        }
                        reading = None;
                    }
                }
                if entry_depth == Some(depth) {
                    entry_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    Some(
        dates
            .into_iter()
            .map(|date| date.map(|(_, text)| text).unwrap_or_default())
            .collect(),
    )
}

/// Detect the language of `text` as an ISO 639-1 code (`en`, `fr`, `zh-cn`).
/// Empty text maps to `unknown`; text without any detectable language is an error.
pub fn detect_language(text: &str) -> Result<String> {
    if text.is_empty() {
        return Ok(UNKNOWN_LANGUAGE.to_string());
    }

    whatlang::detect(text)
        .map(|info| iso_639_1(info.lang().code()).to_string())
        .ok_or_else(|| AggregatorError::Detection("no language features in text".to_string()))
}

/// Two-letter code for a whatlang ISO 639-3 code. Codes without one are kept as is.
fn iso_639_1(code: &'static str) -> &'static str {
    match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh-cn",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}
