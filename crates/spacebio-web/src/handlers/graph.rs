//! Graph endpoints: category bubbles and the paper similarity network.
//!
//! Building and laying out a graph is CPU-bound, so it runs on the blocking pool.

use axum::{
    extract::{Query, State},
    Json,
};
use spacebio_common::error::ApiError;
use spacebio_common::Paper;
use spacebio_kg::{
    apply_layout, build_category_graph, build_knowledge_graph, Dimension, Graph,
    KnowledgeGraphOptions, LayoutConfig,
};
use tracing::debug;

use super::params::{self, QueryParams};
use crate::state::{AppState, SharedState};

/// Papers considered, from `limit` or the configured default, capped by the search max.
fn graph_limit(state: &AppState, query: &QueryParams) -> Result<usize, ApiError> {
    let requested = params::number::<i64>(query, "limit")?
        .map(|l| l.max(0) as usize)
        .unwrap_or(state.config.graph.default_limit);
    Ok(requested.clamp(1, state.search.config().max_limit.max(1)))
}

/// `layout` defaults to on; only an explicit non-`true` value turns it off.
fn wants_layout(query: &QueryParams) -> bool {
    !query.contains_key("layout") || params::flag(query, "layout")
}

/// Build with `build`, lay out when asked, off the async workers.
async fn render<F>(
    state: &AppState,
    query: &QueryParams,
    papers: Vec<Paper>,
    build: F,
) -> Result<Json<Graph>, ApiError>
where
    F: FnOnce(&[Paper]) -> Graph + Send + 'static,
{
    let layout = wants_layout(query)
        .then(|| LayoutConfig { iterations: state.config.graph.iterations, ..LayoutConfig::default() });

    let graph = tokio::task::spawn_blocking(move || {
        let mut graph = build(&papers);
        if let Some(config) = layout {
            apply_layout(&mut graph, &config);
        }
        graph
    })
    .await
    .map_err(ApiError::internal)?;

    debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "Graph built");
    Ok(Json(graph))
}

/// GET /api/graph/categories
pub async fn category_graph(
    State(state): State<SharedState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<Graph>, ApiError> {
    let dimension = match query.get("dimension").map(|d| d.trim()).filter(|d| !d.is_empty()) {
        Some(raw) => raw.parse::<Dimension>().map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => Dimension::Organism,
    };
    let limit = graph_limit(&state, &query)?;
    let papers = state.papers.list(0, limit).await?;
    render(&state, &query, papers, move |papers| build_category_graph(papers, dimension)).await
}

/// GET /api/graph/knowledge
pub async fn knowledge_graph(
    State(state): State<SharedState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<Graph>, ApiError> {
    let limit = graph_limit(&state, &query)?;
    let threshold = params::number::<f64>(&query, "threshold")?
        .unwrap_or(state.config.graph.similarity_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ApiError::BadRequest(format!("threshold must be between 0 and 1, got {threshold}")));
    }
    let options = KnowledgeGraphOptions {
        similarity_threshold: threshold,
        max_links_per_paper: state.config.graph.max_links_per_paper,
    };
    let papers = state.papers.list(0, limit).await?;
    render(&state, &query, papers, move |papers| build_knowledge_graph(papers, &options)).await
}
