//! Chat endpoints: plain and paper-context.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use spacebio_common::error::ApiError;
use spacebio_llm::rag::CONTEXT_PAPERS;
use spacebio_llm::{build_context, with_context, ChatMessage, ChatReply, ContextSource};
use spacebio_search::SearchRequest;
use tracing::debug;

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub search_query: String,
}

#[derive(Debug, Serialize)]
pub struct ContextChatResponse {
    #[serde(flatten)]
    pub reply: ChatReply,
    pub context_papers: usize,
    pub sources: Vec<ContextSource>,
}

fn require_messages(messages: &[ChatMessage]) -> Result<(), ApiError> {
    if messages.is_empty() {
        return Err(ApiError::BadRequest("No messages provided".to_string()));
    }
    Ok(())
}

/// POST /api/chat
pub async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    require_messages(&req.messages)?;
    let reply = state.chat.complete(&req.messages).await?;
    Ok(Json(reply))
}

/// POST /api/chat/context
/// The top search hits for `searchQuery` go in front as a system message.
pub async fn chat_with_context(
    State(state): State<SharedState>,
    Json(req): Json<ContextChatRequest>,
) -> Result<Json<ContextChatResponse>, ApiError> {
    require_messages(&req.messages)?;

    let query = if req.search_query.trim().is_empty() {
        req.messages.last().map(|m| m.content.clone()).unwrap_or_default()
    } else {
        req.search_query.trim().to_string()
    };
    let papers = state.papers.all().await?;
    let hits = state.search.search(
        &papers,
        &SearchRequest { q: query, limit: Some(CONTEXT_PAPERS), ..Default::default() },
    );
    // The zero-hit fallback list is unrelated to the question.
    let top: Vec<_> = if hits.fallback {
        Vec::new()
    } else {
        hits.results.into_iter().map(|hit| hit.paper).collect()
    };

    let context = build_context(&top);
    debug!(papers = context.sources.len(), chars = context.block.len(), "Built chat context");
    let reply = state.chat.complete(&with_context(&req.messages, &context)).await?;

    Ok(Json(ContextChatResponse {
        reply,
        context_papers: context.sources.len(),
        sources: context.sources,
    }))
}
