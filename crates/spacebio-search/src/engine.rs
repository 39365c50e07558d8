//! Search execution: filter, score, rank, page.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use spacebio_common::paper::ABSTRACT_SUMMARY_CHARS;
use spacebio_common::{truncate_with_ellipsis, FilterSet, Paper};
use tracing::debug;

use crate::highlight::highlight;
use crate::query::{lowercase_tokens, parse_query, ParsedQuery};
use crate::weights::SearchConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub offset: usize,
    /// Resolved page size. `None` means the configured default.
    pub limit: Option<usize>,
}

/// A paper plus its relevance score and highlighted fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub paper: Paper,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub highlights: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matches before paging.
    pub total: usize,
    pub results: Vec<SearchHit>,
    /// True when the query matched nothing and an unranked list was returned.
    pub fallback: bool,
}

pub struct SearchEngine {
    config: SearchConfig,
}

/// Lowercased tokens of the scored fields of one paper.
struct FieldTokens {
    title: Vec<String>,
    abstract_text: Vec<String>,
    authors: Vec<String>,
}

impl FieldTokens {
    fn of(paper: &Paper) -> Self {
        Self {
            title: lowercase_tokens(&paper.title),
            abstract_text: lowercase_tokens(&paper.abstract_text),
            authors: lowercase_tokens(&paper.authors),
        }
    }

    fn contains(&self, term: &str) -> bool {
        [&self.title, &self.abstract_text, &self.authors]
            .iter()
            .any(|f| f.iter().any(|t| t == term))
    }
}

fn term_frequency(tokens: &[String], term: &str) -> usize {
    tokens.iter().filter(|t| *t == term).count()
}

/// `1 + ln(tf)` for tf > 0, else 0.
fn tf_weight(tf: usize) -> f64 {
    if tf == 0 {
        0.0
    } else {
        1.0 + (tf as f64).ln()
    }
}

fn idf(total_docs: usize, doc_freq: usize) -> f64 {
    (1.0 + total_docs as f64 / (1.0 + doc_freq as f64)).ln()
}

/// Numeric id order when both ids are integers, string order otherwise.
fn cmp_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn search(&self, papers: &[Paper], request: &SearchRequest) -> SearchResponse {
        self.search_at(papers, request, Utc::now().date_naive())
    }

    /// Run a search with an explicit "today" for the recency boost.
    pub fn search_at(&self, papers: &[Paper], request: &SearchRequest, today: NaiveDate) -> SearchResponse {
        let query = parse_query(&request.q);
        let limit = self.config.clamp_limit(request.limit);

        let candidates: Vec<&Paper> = papers.iter().filter(|p| request.filters.matches(p)).collect();

        let mut scored = if query.is_empty() {
            candidates
                .iter()
                .map(|p| (*p, self.recency(p, today)))
                .collect::<Vec<_>>()
        } else {
            self.score_text(&candidates, &query, today)
        };

        if scored.is_empty() && !query.is_empty() {
            debug!(q = %request.q, "No hits; returning fallback list");
            let fallback: Vec<&Paper> = candidates.into_iter().take(self.config.fallback_size).collect();
            let total = fallback.len();
            let results = fallback
                .into_iter()
                .skip(request.offset)
                .take(limit)
                .map(|p| self.to_hit(p, 0.0, &ParsedQuery::default()))
                .collect();
            return SearchResponse { total, results, fallback: true };
        }

        scored.sort_by(|(pa, sa), (pb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| cmp_ids(&pa.id, &pb.id))
        });

        let total = scored.len();
        let results = scored
            .into_iter()
            .skip(request.offset)
            .take(limit)
            .map(|(p, score)| self.to_hit(p, score, &query))
            .collect();
        debug!(q = %request.q, terms = ?query.terms, total, "Search complete");
        SearchResponse { total, results, fallback: false }
    }

    /// Most-fields tf·idf plus recency. Papers with no text match are dropped.
    fn score_text<'a>(&self, candidates: &[&'a Paper], query: &ParsedQuery, today: NaiveDate) -> Vec<(&'a Paper, f64)> {
        let tokens: Vec<FieldTokens> = candidates.iter().map(|p| FieldTokens::of(p)).collect();
        let n = candidates.len();
        let idfs: HashMap<&str, f64> = query
            .terms
            .iter()
            .map(|term| {
                let df = tokens.iter().filter(|t| t.contains(term)).count();
                (term.as_str(), idf(n, df))
            })
            .collect();

        let w = &self.config.weights;
        candidates
            .iter()
            .zip(&tokens)
            .filter_map(|(paper, ft)| {
                let text: f64 = query
                    .terms
                    .iter()
                    .map(|term| {
                        let idf = idfs.get(term.as_str()).copied().unwrap_or(0.0);
                        (w.title * tf_weight(term_frequency(&ft.title, term))
                            + w.abstract_text * tf_weight(term_frequency(&ft.abstract_text, term))
                            + w.authors * tf_weight(term_frequency(&ft.authors, term)))
                            * idf
                    })
                    .sum();
                (text > 0.0).then(|| (*paper, text + self.recency(paper, today)))
            })
            .collect()
    }

    fn recency(&self, paper: &Paper, today: NaiveDate) -> f64 {
        let Some(start) = paper.year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)) else {
            return 0.0;
        };
        let age_days = (today - start).num_days() as f64;
        self.config.recency_boost(age_days)
    }

    fn to_hit(&self, paper: &Paper, score: f64, query: &ParsedQuery) -> SearchHit {
        let mut highlights = BTreeMap::new();
        for (field, text) in [("title", &paper.title), ("abstract", &paper.abstract_text)] {
            let frags = highlight(text, query);
            if !frags.is_empty() {
                highlights.insert(field.to_string(), frags);
            }
        }
        let mut paper = paper.clone();
        paper.summary = truncate_with_ellipsis(&paper.abstract_text, ABSTRACT_SUMMARY_CHARS);
        SearchHit { paper, score, highlights }
    }
}
