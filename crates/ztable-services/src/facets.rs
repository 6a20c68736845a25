//! Facet cache

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use ztable_core::{ColumnDef, FacetOption, find_column};
use ztable_query::distinct_values;
use ztable_state::{TableAction, TableStore};

use crate::http::fetch_facet_url;
use crate::{CustomFacetFetcher, ServiceError, ServiceResult, TableTransport};

/// What `ensure` did for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetStatus {
    /// Options were already cached (possibly empty)
    Cached,
    /// Options were resolved and stored
    Loaded(usize),
    /// No column with that key
    UnknownColumn,
    /// Another lookup for the field is running
    InFlight,
    /// An edit invalidated the field while the lookup ran; the result was dropped
    Invalidated,
    /// The lookup failed; the field stays uncached and can be retried
    Failed(String),
}

/// Resolves enumerated options for filter and edit widgets, at most once per field until an
/// edit invalidates the field.
///
/// Lookup order: static column options, the column's facet URL (through the transport, or
/// fetched directly without one), the custom facet fetcher, then the transport's default
/// endpoint (or the static records when the table has no transport). A lookup that an edit
/// invalidates midway is discarded.
pub struct FacetCache {
    store: TableStore,
    columns: Arc<Vec<ColumnDef>>,
    transport: Option<Arc<dyn TableTransport>>,
    custom: Option<CustomFacetFetcher>,
    static_records: Option<Arc<Vec<Value>>>,
    in_flight: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for FacetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetCache")
            .field("columns", &self.columns.len())
            .field("transport", &self.transport.is_some())
            .field("custom", &self.custom.is_some())
            .field("in_flight", &*self.in_flight.lock())
            .finish_non_exhaustive()
    }
}

impl FacetCache {
    pub fn new(store: TableStore, columns: Arc<Vec<ColumnDef>>) -> Self {
        Self {
            store,
            columns,
            transport: None,
            custom: None,
            static_records: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn TableTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_custom_fetcher(mut self, fetcher: CustomFacetFetcher) -> Self {
        self.custom = Some(fetcher);
        self
    }

    pub fn with_static_records(mut self, records: Arc<Vec<Value>>) -> Self {
        self.static_records = Some(records);
        self
    }

    /// Make sure options for `field` are cached
    #[tracing::instrument(skip(self))]
    pub async fn ensure(&self, field: &str) -> FacetStatus {
        let state = self.store.state();
        if state.facet_options(field).is_some() {
            return FacetStatus::Cached;
        }
        let revision = state.facet_revision(field);
        let Some(column) = find_column(&self.columns, field).cloned() else {
            return FacetStatus::UnknownColumn;
        };

        if let Some(options) = &column.options {
            return self.store_options(field, FacetOption::normalize_all(options), revision);
        }

        if !self.in_flight.lock().insert(field.to_string()) {
            return FacetStatus::InFlight;
        }
        let result = self.lookup(field, &column).await;
        self.in_flight.lock().remove(field);

        match result {
            Ok(values) => self.store_options(field, FacetOption::normalize_all(&values), revision),
            Err(e) => {
                tracing::warn!(field = %field, error = %e, "facet lookup failed");
                FacetStatus::Failed(e.to_string())
            }
        }
    }

    async fn lookup(&self, field: &str, column: &ColumnDef) -> ServiceResult<Vec<Value>> {
        if let Some(url) = &column.facet_url {
            return match &self.transport {
                Some(transport) => transport.fetch_facets(field, Some(url)).await,
                None => fetch_facet_url(field, url).await,
            };
        }
        if let Some(fetch) = &self.custom {
            return fetch(field.to_string(), column.clone()).await;
        }
        if let Some(transport) = &self.transport {
            return transport.fetch_facets(field, None).await;
        }
        if let Some(records) = &self.static_records {
            return Ok(distinct_values(records, field));
        }
        Err(ServiceError::Facet {
            field: field.to_string(),
            message: "no facet source configured".to_string(),
        })
    }

    fn store_options(&self, field: &str, options: Vec<FacetOption>, revision: u64) -> FacetStatus {
        let count = options.len();
        let state = self.store.dispatch(TableAction::LoadFacets {
            field: field.to_string(),
            options,
            revision,
        });
        if state.facet_revision(field) != revision {
            tracing::debug!(field = %field, "facets invalidated during lookup, result dropped");
            return FacetStatus::Invalidated;
        }
        tracing::debug!(field = %field, options = count, "facets cached");
        FacetStatus::Loaded(count)
    }
}
