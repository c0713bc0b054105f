mod common;

use common::{init_tracing, registry};
use news_aggregator::{AggregatorError, Aggregator, FeedFetcher, FeedSource, FetchConfig, Fetcher};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example World News</title>
    <link>https://example.com</link>
    <description>World news</description>
    <item>
      <title>Central bank holds interest rates steady</title>
      <link>https://example.com/rates</link>
      <description>The central bank kept its benchmark rate unchanged for the third meeting in a row, citing stable inflation.</description>
      <pubDate>Mon, 09 Jun 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Heatwave expected this weekend</title>
      <link>https://example.com/heatwave</link>
      <description>Forecasters warned that temperatures could climb well above the seasonal average across the south.</description>
    </item>
  </channel>
</rss>"#;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Exemple</title>
  <id>urn:example:feed</id>
  <updated>2025-06-09T08:00:00Z</updated>
  <entry>
    <title>La réforme des retraites adoptée</title>
    <id>urn:example:1</id>
    <link href="https://example.fr/retraites"/>
    <published>2025-06-09T07:00:00Z</published>
    <updated>2025-06-09T07:00:00Z</updated>
    <summary>Le Parlement a adopté définitivement la réforme des retraites après plusieurs mois de débats.</summary>
  </entry>
</feed>"#;

fn test_config() -> FetchConfig {
    FetchConfig {
        user_agent: "news-aggregator-test/0.1".to_string(),
        timeout_seconds: 1,
        max_retries: 0,
        retry_delay_seconds: 0,
        fetch_delay: Duration::ZERO,
        max_concurrency: 4,
        max_redirects: 5,
    }
}

fn source(server: &MockServer, country: &str, agency: &str, feed_path: &str) -> FeedSource {
    FeedSource::new(country, agency, format!("{}{}", server.uri(), feed_path))
}

async fn mount(server: &MockServer, feed_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_rss_feed() {
    init_tracing();

    let server = MockServer::start().await;
    mount(&server, "/rss.xml", ResponseTemplate::new(200).set_body_string(RSS)).await;

    let fetcher = Fetcher::new(test_config()).unwrap();
    let articles = fetcher.fetch(&source(&server, "UK", "BBC", "/rss.xml")).await;

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].country, "UK");
    assert_eq!(articles[0].news_agency, "BBC");
    assert_eq!(articles[0].title, "Central bank holds interest rates steady");
    assert_eq!(articles[0].news_url, "https://example.com/rates");
    assert_eq!(articles[0].language, "en");
    assert_eq!(articles[0].publication_date, "Mon, 09 Jun 2025 08:00:00 GMT");
    assert_eq!(articles[1].publication_date, "");
}

#[tokio::test]
async fn test_fetch_atom_feed() {
    init_tracing();

    let server = MockServer::start().await;
    mount(&server, "/atom.xml", ResponseTemplate::new(200).set_body_string(ATOM)).await;

    let fetcher = Fetcher::new(test_config()).unwrap();
    let articles = fetcher.fetch(&source(&server, "France", "Le Monde", "/atom.xml")).await;

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "La réforme des retraites adoptée");
    assert_eq!(articles[0].news_url, "https://example.fr/retraites");
    assert_eq!(articles[0].language, "fr");
    assert_eq!(articles[0].publication_date, "2025-06-09T07:00:00Z");
}

#[tokio::test]
async fn test_server_error_yields_no_articles() {
    init_tracing();

    let server = MockServer::start().await;
    mount(&server, "/broken.xml", ResponseTemplate::new(500).set_body_string("Internal Server Error")).await;

    let fetcher = Fetcher::new(test_config()).unwrap();
    let feed = source(&server, "USA", "CNN", "/broken.xml");

    let result = fetcher.try_fetch(&feed).await;
    assert!(matches!(result, Err(AggregatorError::Status { status: 500 })));
    assert!(fetcher.fetch(&feed).await.is_empty());
}

#[tokio::test]
async fn test_unparsable_body_yields_no_articles() {
    init_tracing();

    let server = MockServer::start().await;
    mount(&server, "/page.html", ResponseTemplate::new(200).set_body_string("<html><body>Not a feed</body></html>")).await;

    let fetcher = Fetcher::new(test_config()).unwrap();
    let feed = source(&server, "Italy", "ANSA", "/page.html");

    assert!(matches!(fetcher.try_fetch(&feed).await, Err(AggregatorError::Parse(_))));
    assert!(fetcher.fetch(&feed).await.is_empty());
}

#[tokio::test]
async fn test_hung_feed_times_out() {
    init_tracing();

    let server = MockServer::start().await;
    mount(
        &server,
        "/slow.xml",
        ResponseTemplate::new(200)
            .set_body_string(RSS)
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let fetcher = Fetcher::new(test_config()).unwrap();
    let started = std::time::Instant::now();
    let articles = fetcher.fetch(&source(&server, "Brazil", "Estadao", "/slow.xml")).await;

    assert!(articles.is_empty());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_retries_recover_from_transient_failure() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "/flaky.xml", ResponseTemplate::new(200).set_body_string(RSS)).await;

    let config = FetchConfig {
        max_retries: 2,
        ..test_config()
    };
    let fetcher = Fetcher::new(config).unwrap();
    let articles = fetcher.fetch(&source(&server, "Canada", "Global News", "/flaky.xml")).await;

    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn test_dead_feed_does_not_affect_others() {
    init_tracing();

    let server = MockServer::start().await;
    mount(&server, "/good.xml", ResponseTemplate::new(200).set_body_string(RSS)).await;
    mount(&server, "/bad.xml", ResponseTemplate::new(404)).await;

    let good = source(&server, "UK", "BBC", "/good.xml");
    let bad = source(&server, "Mexico", "Proceso", "/bad.xml");

    let fetcher = Arc::new(Fetcher::new(test_config()).unwrap());
    let aggregator = Aggregator::from_config(fetcher, &test_config());

    let both = aggregator.aggregate_all(&registry(&[good.clone(), bad])).await;
    let alone = aggregator.aggregate_all(&registry(&[good])).await;

    assert_eq!(both.len(), 2);
    assert_eq!(both, alone);
}
