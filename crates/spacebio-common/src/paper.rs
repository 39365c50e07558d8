//! The Paper record served by every list and search endpoint.
//! Field names on the wire follow the dashboard's camelCase contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_AUTHORS: &str = "Unknown Author";
pub const DEFAULT_MISSION: &str = "Unknown Mission";
pub const DEFAULT_ENVIRONMENT: &str = "Space Environment";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const DEFAULT_YEAR: i32 = 2023;

/// Max chars of title kept in a generated summary.
pub const TITLE_SUMMARY_CHARS: usize = 100;
/// Max chars of abstract kept in a generated summary.
pub const ABSTRACT_SUMMARY_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Paper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub url: String,
    pub organism: Option<String>,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub authors: String,
    pub mission: String,
    pub environment: String,
    pub summary: String,
    pub citations: i64,
    #[serde(rename = "hasOSDR")]
    pub has_osdr: bool,
    #[serde(rename = "hasDOI")]
    pub has_doi: bool,
    pub bookmarked: bool,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub key_results: Vec<String>,
    pub methods: String,
    pub conclusions: String,
    pub doi: String,
    pub osdr_link: String,
    pub task_book_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmcid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Paper {
    /// A paper with only title and url known; every enriched field takes its default.
    pub fn with_defaults(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            summary: truncate_with_ellipsis(&title, TITLE_SUMMARY_CHARS),
            abstract_text: title.clone(),
            title,
            url: url.into(),
            organism: None,
            year: Some(DEFAULT_YEAR),
            source: None,
            authors: DEFAULT_AUTHORS.to_string(),
            mission: DEFAULT_MISSION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            citations: 0,
            has_osdr: false,
            has_doi: false,
            bookmarked: false,
            key_results: Vec::new(),
            methods: NOT_SPECIFIED.to_string(),
            conclusions: NOT_SPECIFIED.to_string(),
            doi: String::new(),
            osdr_link: String::new(),
            task_book_link: String::new(),
            pdf_url: None,
            pmcid: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn title_entry(&self) -> PaperTitle {
        PaperTitle { id: self.id.clone(), title: self.title.clone() }
    }

    /// Title, abstract, summary, methods and key results joined for text scans.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.abstract_text.len() + self.summary.len() + 64,
        );
        for part in [&self.title, &self.abstract_text, &self.summary, &self.methods] {
            text.push_str(part);
            text.push(' ');
        }
        for result in &self.key_results {
            text.push_str(result);
            text.push(' ');
        }
        text
    }
}

/// `{id, title}` pair served by `/api/papers/titles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperTitle {
    pub id: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// PaperDraft
// ---------------------------------------------------------------------------

/// Client-supplied paper fields, all optional.
///
/// Used both for creating papers (missing fields take defaults) and for
/// partial updates (only provided fields overwrite).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperDraft {
    pub title: Option<String>,
    pub url: Option<String>,
    pub organism: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    pub source: Option<String>,
    pub authors: Option<String>,
    pub mission: Option<String>,
    pub environment: Option<String>,
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub citations: Option<i64>,
    #[serde(rename = "hasOSDR", default, deserialize_with = "lenient_bool")]
    pub has_osdr: Option<bool>,
    #[serde(rename = "hasDOI", default, deserialize_with = "lenient_bool")]
    pub has_doi: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub bookmarked: Option<bool>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub key_results: Option<Vec<String>>,
    pub methods: Option<String>,
    pub conclusions: Option<String>,
    pub doi: Option<String>,
    pub osdr_link: Option<String>,
    pub task_book_link: Option<String>,
}

impl PaperDraft {
    /// Title and url, both trimmed and non-empty, or `None`.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let title = self.title.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((title, url))
    }

    /// Build a new paper, or `None` when title or url is missing.
    pub fn into_paper(self, id: impl Into<String>) -> Option<Paper> {
        let (title, url) = self.required_fields()?;
        let mut paper = Paper::with_defaults(id, title, url);
        self.apply_to(&mut paper);
        Some(paper)
    }

    /// Overwrite every provided field of `paper`. The id is never touched.
    pub fn apply_to(&self, paper: &mut Paper) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        // Blank title/url would break the record, so they are ignored.
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            paper.title = title.to_string();
        }
        if let Some(url) = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            paper.url = url.to_string();
        }
        if self.organism.is_some() {
            paper.organism = self.organism.clone();
        }
        if self.year.is_some() {
            paper.year = self.year;
        }
        if self.source.is_some() {
            paper.source = self.source.clone();
        }
        set(&mut paper.authors, &self.authors);
        set(&mut paper.mission, &self.mission);
        set(&mut paper.environment, &self.environment);
        set(&mut paper.summary, &self.summary);
        set(&mut paper.citations, &self.citations);
        set(&mut paper.has_osdr, &self.has_osdr);
        set(&mut paper.has_doi, &self.has_doi);
        set(&mut paper.bookmarked, &self.bookmarked);
        set(&mut paper.abstract_text, &self.abstract_text);
        set(&mut paper.key_results, &self.key_results);
        set(&mut paper.methods, &self.methods);
        set(&mut paper.conclusions, &self.conclusions);
        set(&mut paper.doi, &self.doi);
        set(&mut paper.osdr_link, &self.osdr_link);
        set(&mut paper.task_book_link, &self.task_book_link);
    }
}

// ── Lenient scalars ───────────────────────────────────────────────────────────
//
// Scraped rows carry numbers and flags as strings ("2019", "yes").
// Null or absent stays `None`; anything unreadable takes the field default.

/// `true`, `1`, `yes` or `y`, in any case.
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "y")
}

/// Integer from a JSON number or a string such as `"12"` or `"12.0"`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn lenient_year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.filter(|v| !v.is_null()).map(|v| {
        coerce_int(&v)
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(DEFAULT_YEAR)
    }))
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .filter(|v| !v.is_null())
        .map(|v| coerce_int(&v).unwrap_or(0)))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| match v {
        Value::Null => None,
        Value::Bool(b) => Some(b),
        Value::String(s) => Some(parse_bool(&s)),
        other => Some(parse_bool(&other.to_string())),
    }))
}

/// Keep the first `max_chars` characters and append `...` when the text was longer.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_title() {
        let long_title = "Microgravity ".repeat(10);
        let paper = Paper::with_defaults("1", long_title.clone(), "https://example.org/a");
        assert_eq!(paper.abstract_text, long_title);
        assert!(paper.summary.ends_with("..."));
        assert_eq!(paper.summary.chars().count(), TITLE_SUMMARY_CHARS + 3);
        assert_eq!(paper.authors, DEFAULT_AUTHORS);
        assert_eq!(paper.year, Some(DEFAULT_YEAR));
    }

    #[test]
    fn test_wire_names() {
        let paper = Paper::with_defaults("7", "Bone loss in mice", "https://example.org/b");
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["hasOSDR"], false);
        assert_eq!(json["hasDOI"], false);
        assert_eq!(json["abstract"], "Bone loss in mice");
        assert!(json["keyResults"].is_array());
        assert!(json["taskBookLink"].is_string());
        assert!(json.get("pmcid").is_none());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("ééééé", 2), "éé...");
    }

    #[test]
    fn test_draft_requires_title_and_url() {
        let draft = PaperDraft { title: Some("  ".into()), url: Some("u".into()), ..Default::default() };
        assert!(draft.into_paper("1").is_none());

        let draft = PaperDraft {
            title: Some("Plant roots on ISS".into()),
            url: Some("https://example.org/p".into()),
            mission: Some("Veggie".into()),
            key_results: Some(vec!["roots skew".into()]),
            ..Default::default()
        };
        let paper = draft.into_paper("3").unwrap();
        assert_eq!(paper.mission, "Veggie");
        assert_eq!(paper.key_results, vec!["roots skew".to_string()]);
        assert_eq!(paper.methods, NOT_SPECIFIED);
    }

    #[test]
    fn test_draft_partial_update_keeps_id() {
        let mut paper = Paper::with_defaults("9", "Old", "https://example.org/o");
        let patch = PaperDraft { bookmarked: Some(true), title: Some("New".into()), ..Default::default() };
        patch.apply_to(&mut paper);
        assert_eq!(paper.id, "9");
        assert_eq!(paper.title, "New");
        assert!(paper.bookmarked);
        assert_eq!(paper.url, "https://example.org/o");
    }

    #[test]
    fn test_draft_coerces_loose_scalars() {
        let draft: PaperDraft = serde_json::from_value(serde_json::json!({
            "title": "Rodent Research-1",
            "url": "https://example.org/rr1",
            "year": "2019",
            "citations": "12.0",
            "hasOSDR": "yes",
            "hasDOI": 1,
            "bookmarked": "nope",
        }))
        .unwrap();
        assert_eq!(draft.year, Some(2019));
        assert_eq!(draft.citations, Some(12));
        assert_eq!(draft.has_osdr, Some(true));
        assert_eq!(draft.has_doi, Some(true));
        assert_eq!(draft.bookmarked, Some(false));
    }

    #[test]
    fn test_draft_unreadable_scalars_take_defaults() {
        let draft: PaperDraft = serde_json::from_value(serde_json::json!({
            "year": "n/a",
            "citations": [],
            "hasOSDR": null,
        }))
        .unwrap();
        assert_eq!(draft.year, Some(DEFAULT_YEAR));
        assert_eq!(draft.citations, Some(0));
        assert_eq!(draft.has_osdr, None);
        assert_eq!(draft.has_doi, None);
    }
}
