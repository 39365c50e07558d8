//! PubMed Central landing-page scraper.
//!
//! PMC article pages carry the title in the first `h1`, the DOI as a
//! `doi.org` anchor, and the abstract in a section whose id starts with
//! `abstract`. Everything else (year, authors, PDF link) is best effort.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use spacebio_common::paper::{DEFAULT_AUTHORS, DEFAULT_YEAR};
use tracing::{debug, instrument};
use url::Url;

use super::ArticleSource;
use crate::error::{IngestError, Result};
use crate::models::ArticleMetadata;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const SOURCE_NAME: &str = "PMC";
const MAX_LISTED_AUTHORS: usize = 3;
const MAX_AUTHOR_BLOCK_CHARS: usize = 200;

pub struct PmcClient {
    client: reqwest::Client,
}

impl PmcClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleSource for PmcClient {
    #[instrument(skip(self))]
    async fn fetch_article(&self, url: &str) -> Result<ArticleMetadata> {
        let html_url = strip_fragment(url);
        Url::parse(&html_url).map_err(|e| IngestError::InvalidUrl(format!("{html_url}: {e}")))?;

        let resp = self.client.get(&html_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus { status: status.as_u16(), url: html_url });
        }
        let body = resp.text().await?;
        debug!(bytes = body.len(), "Fetched PMC page");

        let meta = parse_article_html(&body, &html_url);
        if meta.is_empty() {
            return Err(IngestError::EmptyArticle(html_url));
        }
        Ok(meta)
    }
}

/// Drop the `#fragment` part of a URL.
pub fn strip_fragment(url: &str) -> String {
    url.split('#').next().unwrap_or(url).trim().to_string()
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a PMC article page. Pure function: no network access.
pub fn parse_article_html(html: &str, url: &str) -> ArticleMetadata {
    let html_url = strip_fragment(url);
    let doc = Html::parse_document(html);
    let page_text = clean_text(&doc.root_element().text().collect::<Vec<_>>().join(" "));

    let title = doc
        .select(sel(&H1))
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let doi = doc
        .select(sel(&DOI_LINK))
        .filter_map(|a| a.value().attr("href"))
        .find(|href| doi_url_regex().is_match(href))
        .map(str::to_string);

    let pmcid = extract_pmcid(&page_text, &html_url);

    ArticleMetadata {
        title,
        doi,
        abstract_text: extract_abstract(&doc),
        pdf_url: extract_pdf_url(&doc, &html_url, pmcid.as_deref()),
        pmcid,
        year: extract_year(&doc, &page_text).unwrap_or(DEFAULT_YEAR),
        authors: extract_authors(&doc).unwrap_or_else(|| DEFAULT_AUTHORS.to_string()),
        source: SOURCE_NAME.to_string(),
        html_url,
    }
}

fn extract_abstract(doc: &Html) -> Option<String> {
    if let Some(section) = doc.select(sel(&ABSTRACT_SECTION)).next() {
        let paragraphs: Vec<String> = section
            .select(sel(&PARAGRAPH))
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        let text = if paragraphs.is_empty() {
            // No <p> children: take the section text minus its headings.
            let heading_text: Vec<String> = section.select(sel(&HEADING)).map(element_text).collect();
            let mut text = element_text(section);
            for h in heading_text {
                text = text.replacen(&h, "", 1);
            }
            clean_text(&text)
        } else {
            paragraphs.join(" ")
        };
        return Some(text).filter(|t| !t.is_empty());
    }

    // Fallback: text following an "Abstract" heading up to the next heading.
    let heading = doc
        .select(sel(&HEADING))
        .find(|h| element_text(*h).to_lowercase().contains("abstract"))?;
    let mut parts = Vec::new();
    for node in heading.next_siblings() {
        let Some(el) = ElementRef::wrap(node) else { continue };
        match el.value().name() {
            "h2" | "h3" => break,
            "p" | "div" => {
                let t = element_text(el);
                if !t.is_empty() {
                    parts.push(t);
                }
            }
            _ => {}
        }
    }
    Some(parts.join(" ")).filter(|t| !t.is_empty())
}

fn extract_pdf_url(doc: &Html, html_url: &str, pmcid: Option<&str>) -> Option<String> {
    let base = Url::parse(html_url).ok()?;
    if let Some(href) = doc.select(sel(&PDF_LINK)).find_map(|a| a.value().attr("href")) {
        if let Ok(resolved) = base.join(href) {
            return Some(resolved.to_string());
        }
    }
    let pmcid = pmcid.filter(|_| base.path().contains("/articles/PMC"))?;
    base.join(&format!("/articles/{pmcid}/pdf")).ok().map(|u| u.to_string())
}

fn extract_pmcid(page_text: &str, html_url: &str) -> Option<String> {
    if let Some(cap) = pmcid_text_regex().captures(page_text) {
        return Some(cap[1].to_uppercase());
    }
    Url::parse(html_url).ok().and_then(|u| {
        u.path_segments()?
            .find(|seg| pmcid_segment_regex().is_match(seg))
            .map(str::to_string)
    })
}

/// First publication year found by the date patterns, then by a date meta tag.
fn extract_year(doc: &Html, page_text: &str) -> Option<i32> {
    for (re, group) in year_patterns() {
        if let Some(year) = re
            .captures(page_text)
            .and_then(|c| c.get(*group))
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .filter(|y| plausible_year(*y))
        {
            return Some(year);
        }
    }

    doc.select(sel(&META_NAMED))
        .filter(|m| m.value().attr("name").is_some_and(|n| date_meta_regex().is_match(n)))
        .filter_map(|m| m.value().attr("content"))
        .find_map(|content| {
            four_digits_regex()
                .find(content)
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .filter(|y| plausible_year(*y))
        })
}

fn extract_authors(doc: &Html) -> Option<String> {
    let from_meta = doc
        .select(sel(&META_NAMED))
        .filter(|m| m.value().attr("name").is_some_and(|n| author_regex().is_match(n)))
        .filter_map(|m| m.value().attr("content"))
        .map(clean_text)
        .find(|c| !c.is_empty());
    if from_meta.is_some() {
        return from_meta;
    }

    let block = doc
        .select(sel(&CLASSED_BLOCK))
        .find(|el| el.value().attr("class").is_some_and(|c| author_regex().is_match(c)))?;

    let names: Vec<String> = block
        .select(sel(&ANCHOR))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .take(MAX_LISTED_AUTHORS)
        .collect();
    if !names.is_empty() {
        return Some(names.join(", "));
    }

    let text = element_text(block);
    Some(text).filter(|t| !t.is_empty() && t.chars().count() < MAX_AUTHOR_BLOCK_CHARS)
}

fn plausible_year(year: i32) -> bool {
    (1800..=2100).contains(&year)
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Selectors & patterns ──────────────────────────────────────────────────────

type LazySelector = OnceLock<Selector>;

static H1: (LazySelector, &str) = (OnceLock::new(), "h1");
static DOI_LINK: (LazySelector, &str) = (OnceLock::new(), r#"a[href^="https://doi.org/"]"#);
static ABSTRACT_SECTION: (LazySelector, &str) =
    (OnceLock::new(), r#"section[id^="abstract"], div[id^="abstract"]"#);
static PARAGRAPH: (LazySelector, &str) = (OnceLock::new(), "p");
static HEADING: (LazySelector, &str) = (OnceLock::new(), "h2, h3");
static PDF_LINK: (LazySelector, &str) = (OnceLock::new(), r#"a[href$=".pdf"], a[href*="/pdf/"]"#);
static META_NAMED: (LazySelector, &str) = (OnceLock::new(), "meta[name]");
static CLASSED_BLOCK: (LazySelector, &str) = (OnceLock::new(), "div[class], section[class]");
static ANCHOR: (LazySelector, &str) = (OnceLock::new(), "a");

fn sel(entry: &'static (LazySelector, &'static str)) -> &'static Selector {
    entry.0.get_or_init(|| Selector::parse(entry.1).unwrap())
}

fn doi_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://doi\.org/.+").unwrap())
}

fn pmcid_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)PMCID:\s*(PMC\d+)").unwrap())
}

fn pmcid_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PMC\d+$").unwrap())
}

fn author_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)author|creator|contrib").unwrap())
}

fn date_meta_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)date|pub").unwrap())
}

fn four_digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").unwrap())
}

/// Date patterns tried in order, with the capture group holding the year.
fn year_patterns() -> &'static [(Regex, usize)] {
    static PATTERNS: OnceLock<Vec<(Regex, usize)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (Regex::new(r"(?i)Published\s+(\d{4})").unwrap(), 1),          // "Published 2013"
            (Regex::new(r"\b(\d{4})\s+[A-Za-z]+\s+\d{1,2}\b").unwrap(), 1), // "2013 May 15"
            (Regex::new(r"\b\d{1,2}\s+[A-Za-z]+\s+(\d{4})\b").unwrap(), 1), // "15 May 2013"
            (Regex::new(r"[A-Za-z]+\s+\d{1,2},\s+(\d{4})").unwrap(), 1),   // "May 15, 2013"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>PMC</title>
  <meta name="citation_author" content="Smith J">
  <meta name="citation_publication_date" content="2013/04/19">
</head><body>
  <h1>  Spaceflight alters
        bone remodeling in mice </h1>
  <div class="ameta">PMCID: PMC3630201 &nbsp; Published 2013 Apr 19</div>
  <a href="https://doi.org/10.1371/journal.pone.0061372">doi</a>
  <section id="abstract1">
    <h2>Abstract</h2>
    <p>Mice flown on STS-131 showed reduced trabecular bone.</p>
    <p>Osteoclast activity increased.</p>
  </section>
  <a href="/articles/PMC3630201/pdf/pone.0061372.pdf">PDF</a>
</body></html>"#;

    #[test]
    fn test_parse_full_page() {
        let meta = parse_article_html(PAGE, "https://pmc.ncbi.nlm.nih.gov/articles/PMC3630201/#abstract1");
        assert_eq!(meta.title.as_deref(), Some("Spaceflight alters bone remodeling in mice"));
        assert_eq!(meta.doi.as_deref(), Some("https://doi.org/10.1371/journal.pone.0061372"));
        assert_eq!(
            meta.abstract_text.as_deref(),
            Some("Mice flown on STS-131 showed reduced trabecular bone. Osteoclast activity increased.")
        );
        assert_eq!(meta.pmcid.as_deref(), Some("PMC3630201"));
        assert_eq!(
            meta.pdf_url.as_deref(),
            Some("https://pmc.ncbi.nlm.nih.gov/articles/PMC3630201/pdf/pone.0061372.pdf")
        );
        assert_eq!(meta.year, 2013);
        assert_eq!(meta.authors, "Smith J");
        assert_eq!(meta.html_url, "https://pmc.ncbi.nlm.nih.gov/articles/PMC3630201/");
        assert_eq!(meta.source, "PMC");
    }

    #[test]
    fn test_heading_fallback_and_defaults() {
        let page = r#"<html><body>
            <h1>Plant growth in microgravity</h1>
            <div>
              <h2>Abstract</h2>
              <p>Roots lose gravitropic orientation.</p>
              <h2>Introduction</h2>
              <p>Not part of the abstract.</p>
            </div>
            <div class="contrib-group"><a>Lee A</a><a>Kim B</a><a>Park C</a><a>Choi D</a></div>
        </body></html>"#;
        let meta = parse_article_html(page, "https://pmc.ncbi.nlm.nih.gov/articles/PMC42/");
        assert_eq!(meta.abstract_text.as_deref(), Some("Roots lose gravitropic orientation."));
        assert_eq!(meta.authors, "Lee A, Kim B, Park C");
        assert_eq!(meta.year, DEFAULT_YEAR);
        assert!(meta.doi.is_none());
        assert_eq!(meta.pmcid.as_deref(), Some("PMC42"));
        assert_eq!(meta.pdf_url.as_deref(), Some("https://pmc.ncbi.nlm.nih.gov/articles/PMC42/pdf"));
    }

    #[test]
    fn test_empty_page() {
        let meta = parse_article_html("<html><body><p>nothing</p></body></html>", "https://example.org/x");
        assert!(meta.is_empty());
        assert_eq!(meta.authors, DEFAULT_AUTHORS);
        assert!(meta.pdf_url.is_none());
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(strip_fragment("https://a.org/x#y"), "https://a.org/x");
        assert_eq!(strip_fragment("https://a.org/x"), "https://a.org/x");
    }
}
