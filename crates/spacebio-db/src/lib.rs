//! Space Bio Database Layer
//!
//! This crate provides an embedded SQLite store for paper records.
//! A single connection sits behind a mutex and is only touched from
//! `spawn_blocking`, so callers stay fully async.
//!
//! # Example
//!
//! ```rust,no_run
//! use spacebio_db::{Database, PaperRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./data/papers.db").await?;
//!     db.initialize().await?;
//!
//!     let papers = PaperRepository::new(std::sync::Arc::new(db));
//!     println!("{} papers stored", papers.count().await?);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod papers;

pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{PaperEnrichment, TABLE_PAPERS};
pub use papers::PaperRepository;
