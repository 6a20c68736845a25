//! Global search

use serde_json::Value;
use ztable_core::{collect_leaves, get_path, value_to_text};

/// Dot-paths searched by default
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "profile.firstName",
    "profile.lastName",
    "username",
    "contact.primaryEmail",
    "work.company",
    "work.title",
    "work.department",
    "contact.address.city",
    "profile.nationality",
    "work.contractType",
    "finance.salary",
    "finance.creditScore",
    "work.skills",
];

/// Which values of a record a search looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// A fixed list of dot-paths
    Fields(Vec<String>),
    /// Every leaf value of the record
    AllFields,
}

impl Default for SearchScope {
    fn default() -> Self {
        SearchScope::Fields(DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect())
    }
}

/// Split a query into lowercase whitespace-delimited tokens
pub fn search_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Lowercased haystack of the searchable values of a record
pub fn search_haystack(record: &Value, scope: &SearchScope) -> String {
    let mut pieces: Vec<String> = Vec::new();
    match scope {
        SearchScope::Fields(fields) => {
            for field in fields {
                match get_path(record, field) {
                    Some(Value::Array(items)) => {
                        pieces.extend(items.iter().filter(|v| !v.is_null()).map(value_to_text))
                    }
                    Some(value) => pieces.push(value_to_text(value)),
                    None => {}
                }
            }
        }
        SearchScope::AllFields => {
            let mut leaves = Vec::new();
            collect_leaves(record, &mut leaves);
            pieces.extend(leaves.into_iter().map(value_to_text));
        }
    }
    pieces.join(" ").to_lowercase()
}

/// A record matches when every token is a substring of its haystack.
///
/// An empty token list matches everything.
pub fn matches_search(record: &Value, tokens: &[String], scope: &SearchScope) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let haystack = search_haystack(record, scope);
    tokens.iter().all(|token| haystack.contains(token.as_str()))
}
