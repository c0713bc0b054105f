use crate::types::Article;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of filtered articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult {
    pub page: usize,
    pub page_size: usize,
    pub total_articles: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("No articles found for country '{0}'")]
    CountryNotFound(String),

    #[error("No articles found for agency '{0}'")]
    AgencyNotFound(String),

    #[error("Page number out of range")]
    OutOfRange,
}

#[derive(Debug, Clone, Default)]
pub struct NewsQuery {
    pub country: Option<String>,
    pub agency: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl NewsQuery {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            country: None,
            agency: None,
            page,
            page_size,
        }
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = Some(agency.into());
        self
    }

    pub fn run(&self, articles: &[Article]) -> Result<PagedResult, QueryError> {
        query(
            articles,
            self.country.as_deref(),
            self.agency.as_deref(),
            self.page,
            self.page_size,
        )
    }
}

/// Filter by country and agency (case-insensitive, exact), then cut out one page.
///
/// The country filter is checked for emptiness before the agency filter runs.
/// An empty filter string means no filter.
pub fn query(
    articles: &[Article],
    country: Option<&str>,
    agency: Option<&str>,
    page: usize,
    page_size: usize,
) -> Result<PagedResult, QueryError> {
    let mut filtered: Vec<&Article> = articles.iter().collect();

    if let Some(country) = country.filter(|c| !c.is_empty()) {
        let wanted = country.to_lowercase();
        filtered.retain(|a| a.country.to_lowercase() == wanted);
        if filtered.is_empty() {
            return Err(QueryError::CountryNotFound(country.to_string()));
        }
    }

    if let Some(agency) = agency.filter(|a| !a.is_empty()) {
        let wanted = agency.to_lowercase();
        filtered.retain(|a| a.news_agency.to_lowercase() == wanted);
        if filtered.is_empty() {
            return Err(QueryError::AgencyNotFound(agency.to_string()));
        }
    }

    if page == 0 || page_size == 0 {
        return Err(QueryError::OutOfRange);
    }

    let total = filtered.len();
    let start = (page - 1).saturating_mul(page_size);
    if start >= total {
        return Err(QueryError::OutOfRange);
    }
    let end = start.saturating_add(page_size).min(total);

    Ok(PagedResult {
        page,
        page_size,
        total_articles: total,
        articles: filtered[start..end].iter().map(|a| (*a).clone()).collect(),
    })
}
