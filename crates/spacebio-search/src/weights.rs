//! Field weights and tunables for relevance scoring.

use serde::{Deserialize, Serialize};

/// Per-field multipliers applied to each term's tf·idf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub title: f64,
    #[serde(rename = "abstract")]
    pub abstract_text: f64,
    pub authors: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title:         3.0,
            abstract_text: 2.0,
            authors:       1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub weights: FieldWeights,
    /// Page size when the request names none.
    pub default_limit: usize,
    /// Upper bound for any requested page size.
    pub max_limit: usize,
    /// Papers returned when a query matches nothing.
    pub fallback_size: usize,
    /// Age at which the recency boost has decayed to `recency_decay`.
    pub recency_scale_days: f64,
    pub recency_decay: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
            default_limit: 50,
            max_limit: 1000,
            fallback_size: 10,
            recency_scale_days: 365.0,
            recency_decay: 0.5,
        }
    }
}

impl SearchConfig {
    /// Resolve a requested page size: default when absent, clamped to 1..=max_limit.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Gaussian-style decay: `decay^((age/scale)^2)`. Future dates get the full boost.
    pub fn recency_boost(&self, age_days: f64) -> f64 {
        if self.recency_scale_days <= 0.0 {
            return 0.0;
        }
        let x = age_days.max(0.0) / self.recency_scale_days;
        self.recency_decay.powf(x * x)
    }
}
