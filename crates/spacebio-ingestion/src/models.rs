//! Data models for ingestion.

use serde::{Deserialize, Serialize};
use spacebio_common::paper::{ABSTRACT_SUMMARY_CHARS, DEFAULT_AUTHORS};
use spacebio_common::{truncate_with_ellipsis, Paper};
use spacebio_db::PaperEnrichment;

/// Metadata scraped from an article landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub pmcid: Option<String>,
    pub html_url: String,
    pub year: i32,
    pub authors: String,
    pub source: String,
}

impl ArticleMetadata {
    /// True when the page yielded neither a title nor an abstract.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.abstract_text.is_none()
    }

    pub fn to_enrichment(&self) -> PaperEnrichment {
        PaperEnrichment {
            title: self.title.clone(),
            // The placeholder author carries no information, so it never overwrites.
            authors: Some(self.authors.clone()).filter(|a| a != DEFAULT_AUTHORS),
            year: Some(self.year),
            doi: self.doi.clone(),
            abstract_text: self.abstract_text.clone(),
            pdf_url: self.pdf_url.clone(),
            pmcid: self.pmcid.clone(),
            source: Some(self.source.clone()),
        }
    }

    /// Build a fresh paper record for `url`. Storage assigns the id.
    pub fn into_paper(self, url: &str) -> Paper {
        let title = self.title.clone().unwrap_or_else(|| url.to_string());
        let mut paper = Paper::with_defaults("", title, url);
        paper.year = Some(self.year);
        paper.authors = self.authors;
        paper.source = Some(self.source);
        paper.pmcid = self.pmcid;
        paper.pdf_url = self.pdf_url;
        if let Some(doi) = self.doi {
            paper.has_doi = true;
            paper.doi = doi;
        }
        if let Some(abstract_text) = self.abstract_text {
            paper.summary = truncate_with_ellipsis(&abstract_text, ABSTRACT_SUMMARY_CHARS);
            paper.abstract_text = abstract_text;
        }
        paper
    }
}
