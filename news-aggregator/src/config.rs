use crate::registry::SourceRegistry;
use crate::types::{FetchConfig, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "news-aggregator", version, about = "Aggregate, deduplicate and serve news from RSS feeds across many countries")]
pub struct Cli {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the paginated news API and export endpoints
    Serve(ServeArgs),
    /// Run one aggregation and write the CSV and JSON exports
    Fetch,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// TOML feed registry made of [[feed]] tables; the built-in registry is used when absent
    #[arg(long, global = true, env = "NEWS_FEEDS_FILE")]
    pub feeds: Option<PathBuf>,

    #[arg(long, global = true, env = "NEWS_CACHE_TTL_SECS", default_value_t = 600)]
    pub cache_ttl_secs: u64,

    #[arg(long, global = true, env = "NEWS_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// Minimum spacing between feed requests
    #[arg(long, global = true, env = "NEWS_FETCH_DELAY_MS", default_value_t = 1000)]
    pub fetch_delay_ms: u64,

    #[arg(long, global = true, env = "NEWS_MAX_CONCURRENCY", default_value_t = 4)]
    pub max_concurrency: usize,

    #[arg(long, global = true, env = "NEWS_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,

    #[arg(long, global = true, env = "NEWS_USER_AGENT", default_value = "news-aggregator/0.1")]
    pub user_agent: String,

    #[arg(long, global = true, env = "NEWS_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "NEWS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "NEWS_PORT", default_value_t = 5000)]
    pub port: u16,

    #[arg(long, env = "NEWS_DEFAULT_PAGE_SIZE", default_value_t = crate::query::DEFAULT_PAGE_SIZE)]
    pub default_page_size: usize,
}

impl PipelineArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.fetch_timeout_secs,
            max_retries: self.max_retries,
            fetch_delay: Duration::from_millis(self.fetch_delay_ms),
            max_concurrency: self.max_concurrency,
            ..FetchConfig::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn registry(&self) -> Result<SourceRegistry> {
        match &self.feeds {
            Some(path) => SourceRegistry::from_file(path),
            None => Ok(SourceRegistry::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let cli = Cli::try_parse_from(["news-aggregator", "fetch"]).unwrap();
        assert!(matches!(cli.command, Command::Fetch));

        let config = cli.pipeline.fetch_config();
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.fetch_delay, Duration::from_secs(1));
        assert_eq!(config.max_retries, 0);
        assert_eq!(cli.pipeline.cache_ttl(), Duration::from_secs(600));
        assert_eq!(cli.pipeline.output_dir, PathBuf::from("output"));
        assert_eq!(cli.pipeline.registry().unwrap().len(), 25);
    }

    #[test]
    fn serve_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "news-aggregator",
            "serve",
            "--port",
            "8080",
            "--cache-ttl-secs",
            "60",
        ])
        .unwrap();

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, 8080);
                assert_eq!(args.default_page_size, 20);
            }
            Command::Fetch => panic!("expected serve"),
        }
        assert_eq!(cli.pipeline.cache_ttl(), Duration::from_secs(60));
    }
}
