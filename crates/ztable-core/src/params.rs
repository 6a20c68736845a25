//! Request and response shapes shared by the client and the data service

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Record, SortDirection, value_to_number};

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub page: u64,
    pub limit: u64,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub sort_order: SortDirection,
    #[serde(default)]
    pub search: String,
    /// JSON array of filters, absent when no filter is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: String::new(),
            sort_order: SortDirection::Asc,
            search: String::new(),
            filters: None,
        }
    }
}

impl RequestParams {
    /// Query-string pairs for the list endpoint. Empty values are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if !self.sort_by.is_empty() {
            pairs.push(("sortBy", self.sort_by.clone()));
        }
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(filters) = &self.filters {
            pairs.push(("filters", filters.clone()));
        }
        pairs
    }
}

/// Normalized result of a list request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub data: Vec<Record>,
    pub total: u64,
    pub total_pages: u64,
}

impl ResponseEnvelope {
    /// Normalize the output of a response mapper.
    ///
    /// `data` falls back to an empty list, `total` to 0 and `totalPages` to 1 when missing,
    /// malformed, negative or zero.
    pub fn normalize(mapped: &Value) -> Self {
        let data = mapped
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = mapped.get("total").and_then(count).unwrap_or(0);
        let total_pages = mapped
            .get("totalPages")
            .and_then(count)
            .filter(|pages| *pages > 0)
            .unwrap_or(1);
        Self {
            data,
            total,
            total_pages,
        }
    }
}

fn count(value: &Value) -> Option<u64> {
    value_to_number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.floor() as u64)
}

/// Default response mapper: reads `{data, meta: {total, totalPages}}`
pub fn default_response_mapper(raw: &Value) -> Value {
    json!({
        "data": raw.get("data").cloned().unwrap_or(Value::Null),
        "total": raw.pointer("/meta/total").cloned().unwrap_or(Value::Null),
        "totalPages": raw.pointer("/meta/totalPages").cloned().unwrap_or(Value::Null),
    })
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Body returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Record>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_pairs_skip_empty() {
        let params = RequestParams::default();
        let pairs = params.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sortOrder", "asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_normalize_defaults() {
        let envelope = ResponseEnvelope::normalize(&json!({"data": "oops", "total": -3}));
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.total, 0);
        assert_eq!(envelope.total_pages, 1);
    }

    #[test]
    fn test_normalize_through_default_mapper() {
        let raw = json!({"data": [{"id": 1}], "meta": {"total": "23", "page": 1, "limit": 10, "totalPages": 3}});
        let envelope = ResponseEnvelope::normalize(&default_response_mapper(&raw));
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.total, 23);
        assert_eq!(envelope.total_pages, 3);
    }

    #[test]
    fn test_list_response_wire_shape() {
        let response = ListResponse {
            data: vec![],
            meta: PageMeta {
                total: 0,
                page: 1,
                limit: 10,
                total_pages: 0,
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["meta"]["totalPages"], json!(0));
    }
}
