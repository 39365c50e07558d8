//! spacebio-search: In-process ranked search over the paper corpus.
//!
//! A single pass over the stored papers: filters first, then weighted
//! term scoring with a recency boost, then paging. When a query matches
//! nothing, a short unranked list is returned instead so the dashboard
//! never shows an empty page for a typo.

pub mod query;
pub mod weights;
pub mod highlight;
pub mod engine;

pub use engine::{SearchEngine, SearchHit, SearchRequest, SearchResponse};
pub use query::{parse_query, ParsedQuery};
pub use weights::{FieldWeights, SearchConfig};
