//! CSV seeding of the initial paper corpus.
//!
//! The corpus file needs only a title and a url column; every other column
//! is optional and falls back to the paper defaults.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use spacebio_common::paper::{DEFAULT_YEAR, TITLE_SUMMARY_CHARS};
use spacebio_common::{parse_bool, truncate_with_ellipsis, Paper};
use spacebio_db::PaperRepository;
use tracing::{info, warn};

use crate::error::Result;

const TITLE_COLUMNS: &[&str] = &["title", "name"];
const URL_COLUMNS: &[&str] = &["url", "link"];

/// Outcome of parsing one CSV file.
#[derive(Debug, Clone, Default)]
pub struct CsvImport {
    pub papers: Vec<Paper>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Case-insensitive header lookup, tolerant of a leading UTF-8 BOM.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_lowercase(), i))
            .collect();
        Self { index }
    }

    /// First non-blank value among the named columns.
    fn get<'r>(&self, record: &'r StringRecord, names: &[&str]) -> Option<&'r str> {
        names.iter().find_map(|name| {
            let i = *self.index.get(&name.to_lowercase())?;
            record.get(i).map(str::trim).filter(|v| !v.is_empty())
        })
    }

    fn one<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.get(record, &[name])
    }
}

pub fn parse_csv<R: Read>(reader: R) -> Result<CsvImport> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let mut import = CsvImport::default();

    for record in rdr.records() {
        let record = record?;
        import.rows_read += 1;
        match row_to_paper(&columns, &record) {
            Some(paper) => import.papers.push(paper),
            None => import.rows_skipped += 1,
        }
    }
    Ok(import)
}

pub fn import_csv(path: impl AsRef<Path>) -> Result<CsvImport> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_csv(file)
}

/// Load the CSV corpus into an empty store. Returns the number of papers inserted.
pub async fn seed_if_empty(repo: &PaperRepository, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let existing = repo.count().await?;
    if existing > 0 {
        info!(existing, "Paper store already populated; skipping CSV seed");
        return Ok(0);
    }
    if !path.exists() {
        warn!(path = %path.display(), "CSV seed file not found; starting with an empty store");
        return Ok(0);
    }

    let import = import_csv(path)?;
    let inserted = repo.insert_batch(&import.papers).await?;
    info!(
        path = %path.display(),
        rows = import.rows_read,
        skipped = import.rows_skipped,
        inserted = inserted.len(),
        "Seeded paper store from CSV"
    );
    Ok(inserted.len())
}

fn row_to_paper(columns: &Columns, record: &StringRecord) -> Option<Paper> {
    let title = columns.get(record, TITLE_COLUMNS)?;
    let url = columns.get(record, URL_COLUMNS)?;
    let mut paper = Paper::with_defaults("", title, url);

    paper.organism = columns.one(record, "organism").map(str::to_string);
    paper.source = columns.one(record, "source").map(str::to_string);
    paper.year = Some(columns.one(record, "year").map(parse_year).unwrap_or(DEFAULT_YEAR));

    let text_fields: [(&str, &mut String); 8] = [
        ("authors", &mut paper.authors),
        ("mission", &mut paper.mission),
        ("environment", &mut paper.environment),
        ("abstract", &mut paper.abstract_text),
        ("methods", &mut paper.methods),
        ("conclusions", &mut paper.conclusions),
        ("osdrLink", &mut paper.osdr_link),
        ("taskBookLink", &mut paper.task_book_link),
    ];
    for (name, field) in text_fields {
        if let Some(v) = columns.one(record, name) {
            *field = v.to_string();
        }
    }

    paper.summary = match columns.one(record, "summary") {
        Some(s) => s.to_string(),
        None => truncate_with_ellipsis(&paper.title, TITLE_SUMMARY_CHARS),
    };
    if let Some(doi) = columns.one(record, "doi") {
        paper.doi = doi.to_string();
        paper.has_doi = true;
    }
    if let Some(results) = columns.one(record, "keyResults") {
        paper.key_results = results
            .split('|')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(c) = columns.one(record, "citations").and_then(|c| c.parse().ok()) {
        paper.citations = c;
    }
    if let Some(v) = columns.one(record, "hasOSDR") {
        paper.has_osdr = parse_bool(v);
    }
    if let Some(v) = columns.one(record, "hasDOI") {
        paper.has_doi = parse_bool(v);
    }
    if let Some(v) = columns.one(record, "bookmarked") {
        paper.bookmarked = parse_bool(v);
    }
    Some(paper)
}

fn parse_year(raw: &str) -> i32 {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        raw.parse().unwrap_or(DEFAULT_YEAR)
    } else {
        DEFAULT_YEAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacebio_common::paper::{DEFAULT_AUTHORS, NOT_SPECIFIED};
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn test_minimal_columns_take_defaults() {
        let data = "Title,Link\nMice in orbit,https://pmc.ncbi.nlm.nih.gov/articles/PMC1/\n";
        let import = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(import.rows_read, 1);
        let p = &import.papers[0];
        assert_eq!(p.title, "Mice in orbit");
        assert_eq!(p.url, "https://pmc.ncbi.nlm.nih.gov/articles/PMC1/");
        assert_eq!(p.authors, DEFAULT_AUTHORS);
        assert_eq!(p.abstract_text, "Mice in orbit");
        assert_eq!(p.methods, NOT_SPECIFIED);
        assert_eq!(p.year, Some(DEFAULT_YEAR));
        assert!(!p.has_doi);
    }

    #[test]
    fn test_bom_and_name_url_variant() {
        let data = "\u{feff}name,url,year,organism\nRoot growth,https://x.org/1,2019,Arabidopsis\n";
        let import = parse_csv(data.as_bytes()).unwrap();
        let p = &import.papers[0];
        assert_eq!(p.title, "Root growth");
        assert_eq!(p.year, Some(2019));
        assert_eq!(p.organism.as_deref(), Some("Arabidopsis"));
    }

    #[test]
    fn test_skips_rows_missing_required_fields() {
        let data = "title,url\n,https://x.org/1\nNo link,\nGood,https://x.org/2\n";
        let import = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(import.rows_read, 3);
        assert_eq!(import.rows_skipped, 2);
        assert_eq!(import.papers.len(), 1);
    }

    #[test]
    fn test_optional_columns() {
        let data = "title,url,year,doi,keyResults,hasOSDR,citations,bookmarked\n\
                    Bone loss,https://x.org/1,circa 2010,10.1/abc,Less bone| More osteoclasts ,yes,12,0\n";
        let import = parse_csv(data.as_bytes()).unwrap();
        let p = &import.papers[0];
        assert_eq!(p.year, Some(DEFAULT_YEAR));
        assert!(p.has_doi);
        assert_eq!(p.key_results, vec!["Less bone", "More osteoclasts"]);
        assert!(p.has_osdr);
        assert!(!p.bookmarked);
        assert_eq!(p.citations, 12);
    }

    #[test]
    fn test_parse_bool() {
        for v in ["true", "TRUE", "1", "yes", "Y"] {
            assert!(parse_bool(v), "{v}");
        }
        for v in ["false", "0", "no", ""] {
            assert!(!parse_bool(v), "{v}");
        }
    }

    #[tokio::test]
    async fn test_seed_if_empty_runs_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,url").unwrap();
        writeln!(file, "A,https://x.org/a").unwrap();
        writeln!(file, "B,https://x.org/b").unwrap();

        let db = Arc::new(spacebio_db::Database::open_in_memory().unwrap());
        db.initialize().await.unwrap();
        let repo = PaperRepository::new(db);

        assert_eq!(seed_if_empty(&repo, file.path()).await.unwrap(), 2);
        assert_eq!(seed_if_empty(&repo, file.path()).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_seed_missing_file_is_not_an_error() {
        let db = Arc::new(spacebio_db::Database::open_in_memory().unwrap());
        db.initialize().await.unwrap();
        let repo = PaperRepository::new(db);
        assert_eq!(seed_if_empty(&repo, "/nonexistent/papers.csv").await.unwrap(), 0);
    }
}
