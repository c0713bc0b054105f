use clap::Parser;
use news_aggregator::config::{Cli, Command};
use news_aggregator::{create_router, Aggregator, AppState, CacheManager, ExportSink, Fetcher};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_aggregator=info")),
        )
        .init();

    let cli = Cli::parse();

    let registry = Arc::new(cli.pipeline.registry()?);
    let fetch_config = cli.pipeline.fetch_config();
    let fetcher = Arc::new(Fetcher::new(fetch_config.clone())?);
    let aggregator = Aggregator::from_config(fetcher, &fetch_config);

    let export = Arc::new(ExportSink::new(&cli.pipeline.output_dir));
    export.ensure_dir()?;

    info!(
        "Using {} feeds across {} countries (timeout {}s, delay {:?}, concurrency {})",
        registry.len(),
        registry.countries().len(),
        fetch_config.timeout_seconds,
        fetch_config.fetch_delay,
        fetch_config.max_concurrency
    );

    match cli.command {
        Command::Serve(args) => {
            let cache = Arc::new(
                CacheManager::new(registry, aggregator, cli.pipeline.cache_ttl())
                    .with_export(export.clone()),
            );
            let state = AppState {
                cache,
                export,
                default_page_size: args.default_page_size,
            };
            let router = create_router(state);

            let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
            info!("Listening on {}", listener.local_addr()?);
            axum::serve(listener, router).await?;
        }
        Command::Fetch => {
            let articles = Arc::new(aggregator.aggregate_all(&registry).await);
            export.export(articles.clone()).await?;
            info!("Fetched {} unique articles", articles.len());
        }
    }

    Ok(())
}
