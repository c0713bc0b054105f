use crate::cache::CacheManager;
use crate::export::{ExportFormat, ExportSink};
use crate::query::{query, PagedResult, QueryError, DEFAULT_PAGE_SIZE};
use crate::types::AggregatorError;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub export: Arc<ExportSink>,
    pub default_page_size: usize,
}

impl AppState {
    pub fn new(cache: Arc<CacheManager>, export: Arc<ExportSink>) -> Self {
        Self {
            cache,
            export,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/news", get(get_news))
        .route("/export/json", get(export_json))
        .route("/export/csv", get(export_csv))
        .with_state(state)
}

/// Errors surfaced to HTTP clients as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Query(QueryError),
    Export(AggregatorError),
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::Query(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Query(e @ QueryError::OutOfRange) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Query(e) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Export(AggregatorError::ExportNotFound { format }) => {
                (StatusCode::NOT_FOUND, format!("{} file not found", format))
            }
            ApiError::Export(e) => {
                error!("Failed to read export: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read export".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Raw query string values; unparsable numbers fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct NewsParams {
    pub country: Option<String>,
    pub agency: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_or(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>,
) -> Result<Json<PagedResult>, ApiError> {
    let articles = state.cache.get_current().await;

    let page = parse_or(params.page.as_deref(), 1);
    let page_size = parse_or(params.page_size.as_deref(), state.default_page_size);

    let result = query(
        &articles,
        params.country.as_deref(),
        params.agency.as_deref(),
        page,
        page_size,
    )?;
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.cache.snapshot().await;
    Json(json!({
        "status": "ok",
        "articles": snapshot.articles.len(),
        "fetched_at": snapshot.fetched_at_utc.map(|t| t.to_rfc3339()),
    }))
}

async fn export_json(State(state): State<AppState>) -> Result<Response, ApiError> {
    read_export(&state.export, ExportFormat::Json).await
}

async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    read_export(&state.export, ExportFormat::Csv).await
}

async fn read_export(sink: &ExportSink, format: ExportFormat) -> Result<Response, ApiError> {
    let content = sink.read_export(format).await.map_err(ApiError::Export)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], content).into_response())
}
