//! Paper endpoints: listing, search, CRUD, bulk save and add-by-URL.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use spacebio_common::error::ApiError;
use spacebio_common::{Paper, PaperDraft, PaperTitle};
use spacebio_ingestion::dedup::{check_duplicate, DedupResult};
use spacebio_ingestion::IngestError;
use tracing::{info, warn};

use super::params::{self, QueryParams};
use crate::state::{AppEvent, SharedState};

const TITLES_LIMIT: usize = 1000;

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Paper not found: {id}"))
}

/// GET /api/papers
/// Without a query or filters this is a plain storage-order page.
pub async fn list_papers(
    State(state): State<SharedState>,
    Query(query): Query<QueryParams>,
) -> Result<Response, ApiError> {
    let request = params::search_request(&query)?;
    if request.q.is_empty() && request.filters.is_empty() {
        let limit = state.search.config().clamp_limit(request.limit);
        let papers = state.papers.list(request.offset, limit).await?;
        return Ok(Json(papers).into_response());
    }
    let papers = state.papers.all().await?;
    let response = state.search.search(&papers, &request);
    Ok(Json(response.results).into_response())
}

/// GET /api/papers/search
pub async fn search_papers(
    State(state): State<SharedState>,
    Query(query): Query<QueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = params::search_request(&query)?;
    let papers = state.papers.all().await?;
    let response = state.search.search(&papers, &request);
    Ok(Json(response.results))
}

/// GET /api/papers/titles
pub async fn paper_titles(State(state): State<SharedState>) -> Result<Json<Vec<PaperTitle>>, ApiError> {
    Ok(Json(state.papers.titles(TITLES_LIMIT).await?))
}

/// GET /api/papers/{id}
pub async fn get_paper(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Paper>, ApiError> {
    let paper = state.papers.find_by_id(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(paper))
}

/// POST /api/papers
/// Store a paper submitted as JSON, no scraping involved.
pub async fn create_paper(
    State(state): State<SharedState>,
    Json(draft): Json<PaperDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let paper = draft
        .into_paper("")
        .ok_or_else(|| ApiError::BadRequest("Title and URL are required".to_string()))?;
    let stored = state.papers.insert(&paper).await?;
    info!(id = %stored.id, title = %stored.title, "Created paper");
    state.publish(AppEvent::PaperAdded { paper_id: stored.id.clone(), title: stored.title.clone() });
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /api/papers/{id}
pub async fn update_paper(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(draft): Json<PaperDraft>,
) -> Result<Json<Paper>, ApiError> {
    let mut paper = state.papers.find_by_id(&id).await?.ok_or_else(|| not_found(&id))?;
    draft.apply_to(&mut paper);
    if !state.papers.update(&paper).await? {
        return Err(not_found(&id));
    }
    let stored = state.papers.find_by_id(&id).await?.ok_or_else(|| not_found(&id))?;
    state.publish(AppEvent::PaperUpdated { paper_id: id });
    Ok(Json(stored))
}

/// DELETE /api/papers/{id}
pub async fn delete_paper(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.papers.delete(&id).await? {
        return Err(not_found(&id));
    }
    info!(%id, "Deleted paper");
    state.publish(AppEvent::PaperDeleted { paper_id: id.clone() });
    Ok(Json(json!({ "message": format!("Paper {id} deleted") })))
}

/// POST /api/papers/bulk
/// Rows that are not objects or lack a title or url are skipped.
pub async fn bulk_save(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Value::Array(rows) = body else {
        return Err(ApiError::BadRequest("Expected array of papers".to_string()));
    };
    let submitted = rows.len();
    let papers: Vec<Paper> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<PaperDraft>(row).ok())
        .filter_map(|draft| draft.into_paper(""))
        .collect();
    let skipped = submitted - papers.len();
    if skipped > 0 {
        warn!(skipped, "Bulk save skipped unusable rows");
    }

    let saved = state.papers.insert_batch(&papers).await?;
    let total_papers = state.papers.count().await?;
    state.publish(AppEvent::BulkSaved { saved_count: saved.len(), total_papers });

    Ok(Json(json!({
        "message": format!("Successfully saved {} papers", saved.len()),
        "saved_count": saved.len(),
        "total_papers": total_papers,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AddPaperRequest {
    #[serde(default)]
    pub url: Option<String>,
}

fn duplicate_error(result: DedupResult) -> ApiError {
    match result {
        DedupResult::DuplicateDoi(doi) => ApiError::Conflict(format!("Paper already exists (DOI {doi})")),
        _ => ApiError::Conflict("Paper already exists".to_string()),
    }
}

/// POST /api/papers/add
/// Scrape an article page and store it as a new paper.
pub async fn add_paper(
    State(state): State<SharedState>,
    Json(req): Json<AddPaperRequest>,
) -> Result<Response, ApiError> {
    let url = req.url.as_deref().map(str::trim).unwrap_or_default().to_string();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".to_string()));
    }

    let existing = state.papers.identifiers().await?;
    let dedup = check_duplicate(&url, None, &existing);
    if dedup.is_duplicate() {
        return Err(duplicate_error(dedup));
    }

    let fetched = match state.articles.fetch_article(&url).await {
        Ok(meta) if meta.is_empty() => Err(IngestError::EmptyArticle(url.clone())),
        other => other,
    };
    let meta = match fetched {
        Ok(meta) => meta,
        Err(IngestError::InvalidUrl(msg)) => return Err(ApiError::BadRequest(format!("Invalid URL: {msg}"))),
        Err(e) => {
            warn!(%url, error = %e, "Failed to fetch article");
            let body = json!({
                "success": false,
                "message": "Failed to fetch paper metadata",
                "error": e.to_string(),
            });
            return Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response());
        }
    };

    let dedup = check_duplicate(&url, meta.doi.as_deref(), &existing);
    if dedup.is_duplicate() {
        return Err(duplicate_error(dedup));
    }

    let paper = state.papers.insert(&meta.into_paper(&url)).await?;
    info!(id = %paper.id, title = %paper.title, "Added paper");
    state.publish(AppEvent::PaperAdded { paper_id: paper.id.clone(), title: paper.title.clone() });

    Ok(Json(json!({
        "success": true,
        "message": "Paper added successfully",
        "paper": paper,
    }))
    .into_response())
}
