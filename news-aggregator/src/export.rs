use crate::types::{AggregatorError, Article, ArticleSet, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const CSV_COLUMNS: [&str; 7] = [
    "country",
    "news_agency",
    "title",
    "publication_date",
    "summary",
    "news_url",
    "language",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "news_data.json",
            ExportFormat::Csv => "news_data.csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AggregatorError::General(format!("unknown export format: {}", other))),
        }
    }
}

/// Writes the current article set to `news_data.csv` and `news_data.json`.
///
/// Each artifact is written to a temporary file in the output directory and
/// renamed over the previous one, so readers see either the old or the new
/// file, never a partial one.
#[derive(Debug, Clone)]
pub struct ExportSink {
    output_dir: PathBuf,
}

impl ExportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path(&self, format: ExportFormat) -> PathBuf {
        self.output_dir.join(format.file_name())
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    pub async fn export(&self, articles: ArticleSet) -> Result<()> {
        let sink = self.clone();
        tokio::task::spawn_blocking(move || sink.write_all(&articles))
            .await
            .map_err(|e| AggregatorError::General(format!("export task failed: {}", e)))?
    }

    /// Write both artifacts synchronously.
    pub fn write_all(&self, articles: &[Article]) -> Result<()> {
        self.ensure_dir()?;
        self.write_csv(articles)?;
        self.write_json(articles)?;
        info!(
            "Saved {} articles to {} and {}",
            articles.len(),
            self.path(ExportFormat::Csv).display(),
            self.path(ExportFormat::Json).display()
        );
        Ok(())
    }

    fn write_csv(&self, articles: &[Article]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.output_dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut tmp);
            // Header is written explicitly so an empty set still gets one
            writer.write_record(CSV_COLUMNS)?;
            for article in articles {
                writer.serialize(article)?;
            }
            writer.flush()?;
        }
        self.persist(tmp, ExportFormat::Csv)
    }

    fn write_json(&self, articles: &[Article]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.output_dir)?;
        serde_json::to_writer(&mut tmp, articles)?;
        tmp.flush()?;
        self.persist(tmp, ExportFormat::Json)
    }

    fn persist(&self, tmp: NamedTempFile, format: ExportFormat) -> Result<()> {
        tmp.as_file().sync_all()?;
        let path = self.path(format);
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!("Replaced {}", path.display());
        Ok(())
    }

    /// Raw bytes of the last written artifact.
    pub async fn read_export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path(format)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AggregatorError::ExportNotFound {
                format: format.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
