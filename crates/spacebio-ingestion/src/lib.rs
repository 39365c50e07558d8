//! spacebio-ingestion: Getting papers into the store.
//! - CSV seeding of the initial corpus
//! - PubMed Central landing-page scraping
//! - Bulk enrichment of stub records
//! - Duplicate detection for newly added URLs

pub mod sources;
pub mod csv_import;
pub mod enrich;
pub mod dedup;
pub mod models;
pub mod error;

pub use error::{IngestError, Result};
pub use models::ArticleMetadata;
