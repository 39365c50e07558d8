//! Health endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use spacebio_common::error::ApiError;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub count: u64,
    pub with_doi: u64,
    pub with_osdr: u64,
    pub chat_backend: String,
    pub version: &'static str,
}

/// GET /api/health
pub async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.db.stats().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        count: stats.papers,
        with_doi: stats.with_doi,
        with_osdr: stats.with_osdr,
        chat_backend: state.chat.name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    }))
}
