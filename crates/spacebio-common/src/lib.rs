//! spacebio-common: Shared types, errors, and filter logic used across all Space Bio crates.

pub mod error;
pub mod paper;
pub mod filters;

// Re-export commonly used types
pub use paper::{Paper, PaperDraft, PaperTitle, parse_bool, truncate_with_ellipsis};
pub use filters::{FilterKind, FilterSet};
