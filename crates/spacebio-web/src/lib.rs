//! spacebio-web: HTTP API for the Space Bio dashboard.
//!
//! The router serves paper CRUD, ranked search, ingestion, chat and graph
//! views as JSON, plus an SSE stream of store events.

pub mod config;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;
