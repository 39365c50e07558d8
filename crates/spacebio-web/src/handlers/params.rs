//! Query-string helpers shared by the list, search and graph endpoints.
//!
//! Parameters arrive as a raw map so that a malformed number becomes a
//! JSON 400 instead of axum's plain-text rejection.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use spacebio_common::error::ApiError;
use spacebio_common::FilterSet;
use spacebio_search::SearchRequest;

pub type QueryParams = HashMap<String, String>;

/// Parse a numeric parameter. Absent or blank is `None`.
pub fn number<T: FromStr>(params: &QueryParams, name: &str) -> Result<Option<T>, ApiError> {
    match params.get(name).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid value for '{name}': {raw}"))),
    }
}

/// True only for `true`, in any case.
pub fn flag(params: &QueryParams, name: &str) -> bool {
    params
        .get(name)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Comma-separated values, trimmed, blanks dropped.
pub fn list(params: &QueryParams, name: &str) -> BTreeSet<String> {
    params
        .get(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn filters(params: &QueryParams) -> Result<FilterSet, ApiError> {
    Ok(FilterSet {
        year_gte: number(params, "year_gte")?,
        year_lte: number(params, "year_lte")?,
        organisms: list(params, "organism"),
        missions: list(params, "mission"),
        environments: list(params, "environment"),
        tissues: list(params, "tissue"),
        assays: list(params, "assay"),
        outcomes: list(params, "outcome"),
        osdr_only: flag(params, "hasOSDR"),
        has_doi: flag(params, "hasDOI").then_some(true),
    })
}

/// `limit` and `offset`. Negative values clamp to zero; the engine then
/// raises a zero limit to one.
pub fn paging(params: &QueryParams) -> Result<(usize, Option<usize>), ApiError> {
    let offset = number::<i64>(params, "offset")?.unwrap_or(0).max(0) as usize;
    let limit = number::<i64>(params, "limit")?.map(|l| l.max(0) as usize);
    Ok((offset, limit))
}

pub fn search_request(params: &QueryParams) -> Result<SearchRequest, ApiError> {
    let (offset, limit) = paging(params)?;
    Ok(SearchRequest {
        q: params.get("q").map(|q| q.trim().to_string()).unwrap_or_default(),
        filters: filters(params)?,
        offset,
        limit,
    })
}
