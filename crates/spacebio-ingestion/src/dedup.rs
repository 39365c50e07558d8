//! Duplicate detection for newly added papers.
//!
//! A URL is a duplicate when its normalized form matches a stored URL.
//! A matching non-empty DOI also counts.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupResult {
    New,
    DuplicateUrl(String),
    DuplicateDoi(String),
}

impl DedupResult {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, DedupResult::New)
    }
}

/// Drop the fragment and a trailing `/`, lowercase the host.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let normalized = match Url::parse(without_fragment) {
        // `Url` already lowercases the host of special schemes.
        Ok(url) => url.to_string(),
        Err(_) => without_fragment.to_string(),
    };
    normalized.trim_end_matches('/').to_string()
}

fn normalize_doi(raw: &str) -> String {
    let doi = raw.trim().to_lowercase();
    for prefix in ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "doi:"] {
        if let Some(rest) = doi.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    doi
}

/// Check `url` (and optionally `doi`) against stored `(url, doi)` pairs.
pub fn check_duplicate(url: &str, doi: Option<&str>, existing: &[(String, String)]) -> DedupResult {
    let wanted = normalize_url(url);
    if let Some((stored, _)) = existing.iter().find(|(u, _)| normalize_url(u) == wanted) {
        return DedupResult::DuplicateUrl(stored.clone());
    }

    let Some(doi) = doi.map(normalize_doi).filter(|d| !d.is_empty()) else {
        return DedupResult::New;
    };
    existing
        .iter()
        .find(|(_, d)| !d.trim().is_empty() && normalize_doi(d) == doi)
        .map(|(_, d)| DedupResult::DuplicateDoi(d.clone()))
        .unwrap_or(DedupResult::New)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Vec<(String, String)> {
        vec![
            ("https://pmc.ncbi.nlm.nih.gov/articles/PMC1/".into(), "https://doi.org/10.1/abc".into()),
            ("https://example.org/paper".into(), String::new()),
        ]
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://PMC.NCBI.nlm.nih.gov/articles/PMC1/#abstract1"),
            "https://pmc.ncbi.nlm.nih.gov/articles/PMC1"
        );
        assert_eq!(normalize_url("not a url/"), "not a url");
    }

    #[test]
    fn test_duplicate_url_variants() {
        let r = check_duplicate("https://pmc.ncbi.nlm.nih.gov/articles/PMC1#sec", None, &stored());
        assert!(matches!(r, DedupResult::DuplicateUrl(_)));
        // Path case is significant.
        let r = check_duplicate("https://example.org/Paper", None, &stored());
        assert_eq!(r, DedupResult::New);
    }

    #[test]
    fn test_duplicate_doi() {
        let r = check_duplicate("https://elsewhere.org/x", Some("10.1/ABC"), &stored());
        assert_eq!(r, DedupResult::DuplicateDoi("https://doi.org/10.1/abc".into()));
        assert!(r.is_duplicate());
        // Empty stored DOIs never match.
        let r = check_duplicate("https://elsewhere.org/x", Some(""), &stored());
        assert!(!r.is_duplicate());
    }
}
