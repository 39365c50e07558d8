//! Bulk enrichment of stub paper records.
//!
//! Papers seeded from CSV usually carry only a title and a PMC link. This
//! pass scrapes each PMC page and fills in the missing bibliographic fields.
//! It is non-destructive: a failing paper is recorded and the batch continues.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use spacebio_db::PaperRepository;
use tracing::{info, instrument, warn};

use crate::error::{IngestError, Result};
use crate::sources::ArticleSource;

// ── Progress events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentProgress {
    pub processed: usize,
    pub total: usize,
    pub current_id: String,
    pub current_title: String,
    pub enriched: usize,
    pub errors: usize,
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentOutcome {
    pub id: String,
    pub title: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentOutcome {
    fn new(id: &str, title: &str, status: OutcomeStatus) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            authors: None,
            year: None,
            abstract_length: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub success: bool,
    pub total_papers: usize,
    pub enriched_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub results: Vec<EnrichmentOutcome>,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Enrich every paper that still needs it, one request at a time.
///
/// `delay` is slept between consecutive requests. `on_progress` is called
/// before each paper and once more when the batch finishes.
#[instrument(skip(repo, source, on_progress))]
pub async fn run_enrichment<F>(
    repo: &PaperRepository,
    source: &dyn ArticleSource,
    delay: Duration,
    on_progress: F,
) -> Result<EnrichmentReport>
where
    F: Fn(EnrichmentProgress),
{
    let candidates = repo.find_needing_enrichment().await?;
    let total = candidates.len();
    info!(total, "Starting enrichment batch");

    let mut report = EnrichmentReport {
        success: true,
        total_papers: total,
        enriched_count: 0,
        error_count: 0,
        skipped_count: 0,
        results: Vec::with_capacity(total),
    };

    for (i, paper) in candidates.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        on_progress(EnrichmentProgress {
            processed: i,
            total,
            current_id: paper.id.clone(),
            current_title: paper.title.clone(),
            enriched: report.enriched_count,
            errors: report.error_count,
        });

        let fetched = match source.fetch_article(&paper.url).await {
            Ok(meta) if meta.is_empty() => Err(IngestError::EmptyArticle(paper.url.clone())),
            other => other,
        };

        let outcome = match fetched {
            Ok(meta) => match repo.apply_enrichment(&paper.id, &meta.to_enrichment()).await {
                Ok(true) => {
                    report.enriched_count += 1;
                    let mut o = EnrichmentOutcome::new(&paper.id, &paper.title, OutcomeStatus::Success);
                    o.authors = Some(meta.authors.clone());
                    o.year = Some(meta.year);
                    o.abstract_length = Some(meta.abstract_text.as_deref().map_or(0, |a| a.chars().count()));
                    o
                }
                Ok(false) => {
                    report.skipped_count += 1;
                    EnrichmentOutcome::new(&paper.id, &paper.title, OutcomeStatus::Skipped)
                }
                Err(e) => {
                    warn!(id = %paper.id, error = %e, "Failed to store enrichment");
                    report.error_count += 1;
                    let mut o = EnrichmentOutcome::new(&paper.id, &paper.title, OutcomeStatus::Error);
                    o.error = Some(e.to_string());
                    o
                }
            },
            Err(e) => {
                warn!(id = %paper.id, url = %paper.url, error = %e, "Failed to fetch article");
                report.error_count += 1;
                let mut o = EnrichmentOutcome::new(&paper.id, &paper.title, OutcomeStatus::Error);
                o.error = Some(e.to_string());
                o
            }
        };
        report.results.push(outcome);
    }

    on_progress(EnrichmentProgress {
        processed: total,
        total,
        current_id: String::new(),
        current_title: String::new(),
        enriched: report.enriched_count,
        errors: report.error_count,
    });
    info!(
        enriched = report.enriched_count,
        errors = report.error_count,
        skipped = report.skipped_count,
        "Enrichment batch finished"
    );
    Ok(report)
}
