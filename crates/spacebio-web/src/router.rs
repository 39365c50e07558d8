//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{
    chat::{chat, chat_with_context},
    graph::{category_graph, knowledge_graph},
    ingestion::{enrich_all, parse_article},
    papers::{
        add_paper, bulk_save, create_paper, delete_paper, get_paper, list_papers, paper_titles,
        search_papers, update_paper,
    },
    system::health,
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// CORS from the configured origins. Empty or `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/health", get(health))

        // Papers
        .route("/api/papers",           get(list_papers).post(create_paper))
        .route("/api/papers/search",    get(search_papers))
        .route("/api/papers/titles",    get(paper_titles))
        .route("/api/papers/add",       post(add_paper))
        .route("/api/papers/bulk",      post(bulk_save))
        .route("/api/papers/enrich-all", post(enrich_all))
        .route("/api/papers/{id}",      get(get_paper).put(update_paper).delete(delete_paper))
        .route("/api/pmc/parse",        post(parse_article))

        // Chat
        .route("/api/chat",         post(chat))
        .route("/api/chat/context", post(chat_with_context))

        // Graphs
        .route("/api/graph/categories", get(category_graph))
        .route("/api/graph/knowledge",  get(knowledge_graph))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Middleware
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
