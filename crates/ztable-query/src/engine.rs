//! Query engine: the full filter, search, sort and page pipeline

use serde_json::Value;
use ztable_core::{Filter, ListResponse, RequestParams, SortConfig, parse_filters};

use crate::{SearchScope, matches_all, matches_search, paginate, search_tokens, sort_records};

/// One evaluation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub search: String,
    pub sort: SortConfig,
    pub page: u64,
    pub limit: u64,
}

impl Query {
    /// Build a query from wire parameters. Fails only when `filters` is not a valid filter list.
    pub fn from_params(params: &RequestParams) -> ztable_core::Result<Self> {
        let filters = match params.filters.as_deref() {
            Some(json) if !json.trim().is_empty() => parse_filters(json)?,
            _ => Vec::new(),
        };
        let sort = if params.sort_by.is_empty() {
            SortConfig::default()
        } else {
            SortConfig::new(params.sort_by.clone(), params.sort_order)
        };
        Ok(Self {
            filters,
            search: params.search.clone(),
            sort,
            page: params.page,
            limit: params.limit,
        })
    }
}

/// Stateless evaluator, configured only with what global search looks at
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    scope: SearchScope,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(scope: SearchScope) -> Self {
        Self { scope }
    }

    /// Engine for in-memory tables, where search looks at every value
    pub fn all_fields() -> Self {
        Self::with_scope(SearchScope::AllFields)
    }

    pub fn scope(&self) -> &SearchScope {
        &self.scope
    }

    /// Records passing every filter and every search token, in input order
    pub fn process(&self, records: &[Value], filters: &[Filter], search: &str) -> Vec<Value> {
        let tokens = search_tokens(search);
        records
            .iter()
            .filter(|record| matches_all(record, filters))
            .filter(|record| matches_search(record, &tokens, &self.scope))
            .cloned()
            .collect()
    }

    pub fn sort(&self, records: &mut [Value], sort: &SortConfig) {
        sort_records(records, sort);
    }

    /// Filter, search, sort and slice one page
    pub fn run(&self, records: &[Value], query: &Query) -> ListResponse {
        let mut matched = self.process(records, &query.filters, &query.search);
        self.sort(&mut matched, &query.sort);
        let (data, meta) = paginate(&matched, query.page, query.limit);
        tracing::trace!(
            total = meta.total,
            page = meta.page,
            returned = data.len(),
            "query evaluated"
        );
        ListResponse { data, meta }
    }
}
