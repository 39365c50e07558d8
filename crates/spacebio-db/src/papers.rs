//! Paper repository.
//!
//! Provides CRUD operations for paper records.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use spacebio_common::paper::{ABSTRACT_SUMMARY_CHARS, DEFAULT_AUTHORS};
use spacebio_common::{truncate_with_ellipsis, Paper, PaperTitle};

use crate::database::Database;
use crate::error::Result;
use crate::schema::{row_to_paper, PaperEnrichment, PAPER_COLUMNS};

/// Abstracts shorter than this are considered unenriched.
const MIN_ENRICHED_ABSTRACT_CHARS: i64 = 100;

/// Repository for paper operations.
#[derive(Clone)]
pub struct PaperRepository {
    db: Arc<Database>,
}

impl PaperRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new paper. The stored id is assigned by the database and
    /// returned on the stored copy; `paper.id` is ignored.
    pub async fn insert(&self, paper: &Paper) -> Result<Paper> {
        let paper = paper.clone();
        self.db
            .call(move |conn| {
                let now = Utc::now();
                let id = insert_row(conn, &paper, &now.to_rfc3339())?;
                Ok(stored_copy(paper, id, now))
            })
            .await
    }

    /// Insert multiple papers in one transaction.
    pub async fn insert_batch(&self, papers: &[Paper]) -> Result<Vec<Paper>> {
        if papers.is_empty() {
            return Ok(Vec::new());
        }

        let papers = papers.to_vec();
        self.db
            .call(move |conn| {
                let now = Utc::now();
                let stamp = now.to_rfc3339();
                let tx = conn.transaction()?;
                let mut stored = Vec::with_capacity(papers.len());
                for paper in papers {
                    let id = insert_row(&tx, &paper, &stamp)?;
                    stored.push(stored_copy(paper, id, now));
                }
                tx.commit()?;
                Ok(stored)
            })
            .await
    }

    /// Find a paper by ID.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Paper>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        self.db
            .call(move |conn| {
                let sql = format!("SELECT {PAPER_COLUMNS} FROM papers WHERE id = ?1");
                Ok(conn.query_row(&sql, params![id], row_to_paper).optional()?)
            })
            .await
    }

    /// Find a paper by its exact stored URL.
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Paper>> {
        let url = url.to_string();
        self.db
            .call(move |conn| {
                let sql = format!("SELECT {PAPER_COLUMNS} FROM papers WHERE url = ?1 ORDER BY id LIMIT 1");
                Ok(conn.query_row(&sql, params![url], row_to_paper).optional()?)
            })
            .await
    }

    /// List papers with pagination, in insertion order.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Paper>> {
        self.db
            .call(move |conn| {
                let sql = format!("SELECT {PAPER_COLUMNS} FROM papers ORDER BY id LIMIT ?1 OFFSET ?2");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit as i64, offset as i64], row_to_paper)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Every stored paper, in insertion order.
    pub async fn all(&self) -> Result<Vec<Paper>> {
        self.db
            .call(|conn| {
                let sql = format!("SELECT {PAPER_COLUMNS} FROM papers ORDER BY id");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_paper)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    pub async fn titles(&self, limit: usize) -> Result<Vec<PaperTitle>> {
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT id, title FROM papers ORDER BY id LIMIT ?1")?;
                let rows = stmt.query_map(params![limit as i64], |row| {
                    let id: i64 = row.get(0)?;
                    Ok(PaperTitle { id: id.to_string(), title: row.get(1)? })
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Count total papers.
    pub async fn count(&self) -> Result<u64> {
        self.db
            .call(|conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
                Ok(n.max(0) as u64)
            })
            .await
    }

    /// All stored `(url, doi)` pairs, for duplicate checks.
    pub async fn identifiers(&self) -> Result<Vec<(String, String)>> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT url, doi FROM papers ORDER BY id")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Replace every column of an existing paper. Returns `false` when the id is unknown.
    pub async fn update(&self, paper: &Paper) -> Result<bool> {
        let Some(id) = parse_id(&paper.id) else {
            return Ok(false);
        };
        let paper = paper.clone();
        self.db
            .call(move |conn| {
                let key_results = serde_json::to_string(&paper.key_results)?;
                let changed = conn.execute(
                    "UPDATE papers SET
                        title = ?1, url = ?2, organism = ?3, year = ?4, source = ?5,
                        authors = ?6, mission = ?7, environment = ?8, summary = ?9,
                        citations = ?10, has_osdr = ?11, has_doi = ?12, bookmarked = ?13,
                        abstract = ?14, key_results = ?15, methods = ?16, conclusions = ?17,
                        doi = ?18, osdr_link = ?19, task_book_link = ?20, pdf_url = ?21,
                        pmcid = ?22, updated_at = ?23
                     WHERE id = ?24",
                    params![
                        paper.title,
                        paper.url,
                        paper.organism,
                        paper.year,
                        paper.source,
                        paper.authors,
                        paper.mission,
                        paper.environment,
                        paper.summary,
                        paper.citations,
                        paper.has_osdr,
                        paper.has_doi,
                        paper.bookmarked,
                        paper.abstract_text,
                        key_results,
                        paper.methods,
                        paper.conclusions,
                        paper.doi,
                        paper.osdr_link,
                        paper.task_book_link,
                        paper.pdf_url,
                        paper.pmcid,
                        Utc::now().to_rfc3339(),
                        id,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    /// Delete a paper by ID. Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        self.db
            .call(move |conn| Ok(conn.execute("DELETE FROM papers WHERE id = ?1", params![id])? > 0))
            .await
    }

    /// PMC-hosted papers whose abstract or authors were never filled in.
    pub async fn find_needing_enrichment(&self) -> Result<Vec<Paper>> {
        self.db
            .call(|conn| {
                let sql = format!(
                    "SELECT {PAPER_COLUMNS} FROM papers
                     WHERE (url LIKE '%pmc.ncbi.nlm.nih.gov%' OR url LIKE '%ncbi.nlm.nih.gov/pmc%')
                       AND (abstract IS NULL OR length(abstract) < ?1 OR authors = ?2)
                     ORDER BY id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(
                    params![MIN_ENRICHED_ABSTRACT_CHARS, DEFAULT_AUTHORS],
                    row_to_paper,
                )?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
    }

    /// Merge scraped fields into a stored paper. Only provided fields overwrite.
    pub async fn apply_enrichment(&self, id: &str, enrichment: &PaperEnrichment) -> Result<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let e = enrichment.clone();
        let summary = e
            .abstract_text
            .as_deref()
            .map(|a| truncate_with_ellipsis(a, ABSTRACT_SUMMARY_CHARS));
        let has_doi = e.doi.as_ref().map(|d| !d.is_empty());

        self.db
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE papers SET
                        title    = COALESCE(?1, title),
                        authors  = COALESCE(?2, authors),
                        year     = COALESCE(?3, year),
                        doi      = COALESCE(?4, doi),
                        abstract = COALESCE(?5, abstract),
                        pdf_url  = COALESCE(?6, pdf_url),
                        pmcid    = COALESCE(?7, pmcid),
                        source   = COALESCE(?8, source),
                        has_doi  = COALESCE(?9, has_doi),
                        summary  = COALESCE(?10, summary),
                        updated_at = ?11
                     WHERE id = ?12",
                    params![
                        e.title,
                        e.authors,
                        e.year,
                        e.doi,
                        e.abstract_text,
                        e.pdf_url,
                        e.pmcid,
                        e.source,
                        has_doi,
                        summary,
                        Utc::now().to_rfc3339(),
                        id,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
    }
}

fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

fn stored_copy(mut paper: Paper, id: i64, now: chrono::DateTime<Utc>) -> Paper {
    paper.id = id.to_string();
    paper.created_at = Some(now);
    paper.updated_at = Some(now);
    paper
}

fn insert_row(conn: &Connection, paper: &Paper, now: &str) -> Result<i64> {
    let key_results = serde_json::to_string(&paper.key_results)?;
    conn.execute(
        "INSERT INTO papers (
            title, url, organism, year, source, authors, mission, environment, summary,
            citations, has_osdr, has_doi, bookmarked, abstract, key_results, methods,
            conclusions, doi, osdr_link, task_book_link, pdf_url, pmcid, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                   ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)",
        params![
            paper.title,
            paper.url,
            paper.organism,
            paper.year,
            paper.source,
            paper.authors,
            paper.mission,
            paper.environment,
            paper.summary,
            paper.citations,
            paper.has_osdr,
            paper.has_doi,
            paper.bookmarked,
            paper.abstract_text,
            key_results,
            paper.methods,
            paper.conclusions,
            paper.doi,
            paper.osdr_link,
            paper.task_book_link,
            paper.pdf_url,
            paper.pmcid,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
