//! Parsing of list request query strings

use url::form_urlencoded;
use ztable_core::{RequestParams, SortDirection};

/// Parse an integer the lenient way the list endpoint does: a leading integer prefix is
/// accepted, anything else yields `None`.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Zero and malformed values fall back to `default`, negative values clamp to 1
fn page_number(raw: Option<&str>, default: u64) -> u64 {
    match raw.and_then(parse_leading_int) {
        Some(0) | None => default,
        Some(n) => n.max(1) as u64,
    }
}

/// Build list parameters from a raw query string (with or without the leading `?`).
///
/// `page` and `limit` default to 1 and 10 and are never below 1.
pub fn parse_list_query(query: &str) -> RequestParams {
    let mut params = RequestParams::default();
    let mut page = None;
    let mut limit = None;

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            "page" => page = Some(value.into_owned()),
            "limit" => limit = Some(value.into_owned()),
            "sortBy" => params.sort_by = value.into_owned(),
            "sortOrder" => params.sort_order = SortDirection::parse(&value),
            "search" => params.search = value.into_owned(),
            "filters" if !value.is_empty() => params.filters = Some(value.into_owned()),
            _ => {}
        }
    }

    params.page = page_number(page.as_deref(), 1);
    params.limit = page_number(limit.as_deref(), 10);
    params
}
