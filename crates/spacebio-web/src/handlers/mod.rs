//! HTTP handlers for all API routes.

pub mod params;
pub mod papers;
pub mod ingestion;
pub mod chat;
pub mod graph;
pub mod system;
