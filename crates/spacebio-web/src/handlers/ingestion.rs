//! Ingestion endpoints: batch enrichment and one-off article parsing.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Deserialize;
use spacebio_common::error::ApiError;
use spacebio_ingestion::enrich::{run_enrichment, EnrichmentReport};
use spacebio_ingestion::{ArticleMetadata, IngestError};

use crate::state::{AppEvent, SharedState};

/// POST /api/papers/enrich-all
/// Runs in the request task; progress goes out over SSE as it happens.
pub async fn enrich_all(State(state): State<SharedState>) -> Result<Json<EnrichmentReport>, ApiError> {
    let delay = Duration::from_millis(state.config.ingestion.request_delay_ms);
    let report = run_enrichment(&state.papers, state.articles.as_ref(), delay, |progress| {
        state.publish(AppEvent::EnrichmentProgress(progress));
    })
    .await?;

    state.publish(AppEvent::EnrichmentComplete {
        enriched: report.enriched_count,
        errors: report.error_count,
        skipped: report.skipped_count,
    });
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/pmc/parse
/// Scrape without storing.
pub async fn parse_article(
    State(state): State<SharedState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ArticleMetadata>, ApiError> {
    let url = req.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".to_string()));
    }
    let meta = state.articles.fetch_article(url).await?;
    if meta.is_empty() {
        return Err(IngestError::EmptyArticle(url.to_string()).into());
    }
    Ok(Json(meta))
}
