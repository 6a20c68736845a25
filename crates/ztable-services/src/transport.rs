//! The seam between the table engine and wherever the records live

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use ztable_core::{ColumnDef, RequestParams, ResponseEnvelope, default_response_mapper, serialize_filters};
use ztable_state::TableState;

use crate::ServiceResult;

/// Remote endpoints a table talks to.
///
/// Implementations do not need to watch for cancellation themselves: callers race every
/// call against a cancellation token and drop the future when it is superseded.
#[async_trait]
pub trait TableTransport: Send + Sync {
    /// Raw list response body for `params`
    async fn fetch_list(&self, params: &RequestParams) -> ServiceResult<Value>;

    /// Apply `patch` (dot-path keys allowed) to a row, returning the updated record
    async fn update_row(&self, row_id: &str, patch: &Value) -> ServiceResult<Value>;

    /// Raw facet values for `field`. `facet_url` overrides the default endpoint.
    async fn fetch_facets(&self, field: &str, facet_url: Option<&str>) -> ServiceResult<Vec<Value>>;
}

/// Caller-supplied list fetcher, used instead of a transport
pub type CustomFetcher =
    Arc<dyn Fn(RequestParams, CancellationToken) -> BoxFuture<'static, ServiceResult<Value>> + Send + Sync>;

/// Caller-supplied row updater: `(row_id, patch) -> updated record`
pub type CustomRowUpdater =
    Arc<dyn Fn(String, Value) -> BoxFuture<'static, ServiceResult<Value>> + Send + Sync>;

/// Caller-supplied facet lookup: `(field, column) -> raw values`
pub type CustomFacetFetcher =
    Arc<dyn Fn(String, ColumnDef) -> BoxFuture<'static, ServiceResult<Vec<Value>>> + Send + Sync>;

/// Derives request parameters from the current state
pub type RequestMapper = Arc<dyn Fn(&TableState) -> RequestParams + Send + Sync>;

/// Maps a raw response body to `{data, total, totalPages}` before normalization
pub type ResponseMapper = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// `page`, `limit`, sort, the debounced search term and the serialized filters
pub fn default_request_mapper(state: &TableState) -> RequestParams {
    let filters = serialize_filters(&state.active_filters).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to serialize filters, sending none");
        None
    });
    RequestParams {
        page: state.current_page,
        limit: state.page_size,
        sort_by: state.sort_config.key.clone().unwrap_or_default(),
        sort_order: state.sort_config.direction,
        search: state.debounced_search_term.clone(),
        filters,
    }
}

pub(crate) fn default_mappers() -> (RequestMapper, ResponseMapper) {
    (
        Arc::new(default_request_mapper),
        Arc::new(default_response_mapper),
    )
}

/// Map and normalize a raw list body
pub(crate) fn to_envelope(mapper: &ResponseMapper, raw: &Value) -> ResponseEnvelope {
    ResponseEnvelope::normalize(&mapper(raw))
}
