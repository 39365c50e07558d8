//! Table definition and row mapping for papers.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use spacebio_common::Paper;

pub const TABLE_PAPERS: &str = "papers";

pub(crate) const CREATE_PAPERS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS papers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    url             TEXT NOT NULL,
    organism        TEXT,
    year            INTEGER,
    source          TEXT,
    authors         TEXT NOT NULL,
    mission         TEXT NOT NULL,
    environment     TEXT NOT NULL,
    summary         TEXT NOT NULL,
    citations       INTEGER NOT NULL DEFAULT 0,
    has_osdr        INTEGER NOT NULL DEFAULT 0,
    has_doi         INTEGER NOT NULL DEFAULT 0,
    bookmarked      INTEGER NOT NULL DEFAULT 0,
    abstract        TEXT NOT NULL,
    key_results     TEXT NOT NULL DEFAULT '[]',
    methods         TEXT NOT NULL,
    conclusions     TEXT NOT NULL,
    doi             TEXT NOT NULL DEFAULT '',
    osdr_link       TEXT NOT NULL DEFAULT '',
    task_book_link  TEXT NOT NULL DEFAULT '',
    pdf_url         TEXT,
    pmcid           TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_papers_title    ON papers(title);
CREATE INDEX IF NOT EXISTS idx_papers_year     ON papers(year);
CREATE INDEX IF NOT EXISTS idx_papers_organism ON papers(organism);
CREATE INDEX IF NOT EXISTS idx_papers_source   ON papers(source);
CREATE INDEX IF NOT EXISTS idx_papers_url      ON papers(url);
"#;

/// Column list shared by every SELECT so `row_to_paper` can index by position.
pub(crate) const PAPER_COLUMNS: &str = "id, title, url, organism, year, source, authors, mission, \
     environment, summary, citations, has_osdr, has_doi, bookmarked, abstract, key_results, \
     methods, conclusions, doi, osdr_link, task_book_link, pdf_url, pmcid, created_at, updated_at";

pub(crate) fn row_to_paper(row: &Row<'_>) -> rusqlite::Result<Paper> {
    let id: i64 = row.get(0)?;
    let key_results_raw: String = row.get(15)?;
    // Malformed JSON degrades to no key results rather than failing the page.
    let key_results = serde_json::from_str(&key_results_raw).unwrap_or_default();
    let created_at: String = row.get(23)?;
    let updated_at: String = row.get(24)?;

    Ok(Paper {
        id: id.to_string(),
        title: row.get(1)?,
        url: row.get(2)?,
        organism: row.get(3)?,
        year: row.get(4)?,
        source: row.get(5)?,
        authors: row.get(6)?,
        mission: row.get(7)?,
        environment: row.get(8)?,
        summary: row.get(9)?,
        citations: row.get(10)?,
        has_osdr: row.get(11)?,
        has_doi: row.get(12)?,
        bookmarked: row.get(13)?,
        abstract_text: row.get(14)?,
        key_results,
        methods: row.get(16)?,
        conclusions: row.get(17)?,
        doi: row.get(18)?,
        osdr_link: row.get(19)?,
        task_book_link: row.get(20)?,
        pdf_url: row.get(21)?,
        pmcid: row.get(22)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Fields recovered by scraping a paper's landing page.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperEnrichment {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub pmcid: Option<String>,
    pub source: Option<String>,
}
