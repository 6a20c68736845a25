//! Table construction options

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use ztable_core::ColumnDef;
use ztable_persistence::{KeyValueStorage, LocationBar, MemoryLocation, MemoryStorage, PersistenceConfig};

use crate::transport::default_mappers;
use crate::{
    CustomFacetFetcher, CustomFetcher, CustomRowUpdater, RequestMapper, ResponseMapper,
    TableTransport,
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Everything a [`crate::TableController`] is built from.
///
/// A table reads its rows from exactly one place, checked in this order: static records, a
/// custom fetcher, the transport. With none of them the first fetch fails with
/// `ServiceError::Misconfigured`.
#[derive(Clone)]
pub struct TableOptions {
    pub transport: Option<Arc<dyn TableTransport>>,
    pub static_data: Option<Arc<Vec<Value>>>,
    pub custom_fetcher: Option<CustomFetcher>,
    pub custom_row_updater: Option<CustomRowUpdater>,
    pub custom_facet_fetcher: Option<CustomFacetFetcher>,
    pub request_mapper: RequestMapper,
    pub response_mapper: ResponseMapper,

    pub columns: Vec<ColumnDef>,
    pub id_key: String,
    pub accordion_mode: bool,
    pub page_size: u64,
    pub search_debounce: Duration,
    /// Upper bound on one row update, on top of whatever the transport enforces
    pub save_timeout: Option<Duration>,

    pub persistence: PersistenceConfig,
    pub location: Arc<dyn LocationBar>,
    pub local_storage: Arc<dyn KeyValueStorage>,
    pub session_storage: Arc<dyn KeyValueStorage>,
}

impl Default for TableOptions {
    fn default() -> Self {
        let (request_mapper, response_mapper) = default_mappers();
        Self {
            transport: None,
            static_data: None,
            custom_fetcher: None,
            custom_row_updater: None,
            custom_facet_fetcher: None,
            request_mapper,
            response_mapper,
            columns: Vec::new(),
            id_key: "id".to_string(),
            accordion_mode: false,
            page_size: 10,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            save_timeout: None,
            persistence: PersistenceConfig::default(),
            location: Arc::new(MemoryLocation::new("")),
            local_storage: Arc::new(MemoryStorage::new()),
            session_storage: Arc::new(MemoryStorage::new()),
        }
    }
}

impl std::fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableOptions")
            .field("transport", &self.transport.is_some())
            .field("static_rows", &self.static_data.as_ref().map(|d| d.len()))
            .field("custom_fetcher", &self.custom_fetcher.is_some())
            .field("custom_row_updater", &self.custom_row_updater.is_some())
            .field("custom_facet_fetcher", &self.custom_facet_fetcher.is_some())
            .field("columns", &self.columns.len())
            .field("id_key", &self.id_key)
            .field("accordion_mode", &self.accordion_mode)
            .field("page_size", &self.page_size)
            .field("search_debounce", &self.search_debounce)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

impl TableOptions {
    /// Table backed by a remote (or in-process) transport
    pub fn remote(transport: Arc<dyn TableTransport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    /// Table evaluated locally over an in-memory collection
    pub fn static_data(records: Vec<Value>) -> Self {
        Self {
            static_data: Some(Arc::new(records)),
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    pub fn with_accordion_mode(mut self, enabled: bool) -> Self {
        self.accordion_mode = enabled;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self.persistence.default_page_size = self.page_size;
        self
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = Some(timeout);
        self
    }

    pub fn with_custom_fetcher(mut self, fetcher: CustomFetcher) -> Self {
        self.custom_fetcher = Some(fetcher);
        self
    }

    pub fn with_custom_row_updater(mut self, updater: CustomRowUpdater) -> Self {
        self.custom_row_updater = Some(updater);
        self
    }

    pub fn with_custom_facet_fetcher(mut self, fetcher: CustomFacetFetcher) -> Self {
        self.custom_facet_fetcher = Some(fetcher);
        self
    }

    pub fn with_request_mapper(mut self, mapper: RequestMapper) -> Self {
        self.request_mapper = mapper;
        self
    }

    pub fn with_response_mapper(mut self, mapper: ResponseMapper) -> Self {
        self.response_mapper = mapper;
        self
    }

    pub fn with_persistence(mut self, config: PersistenceConfig) -> Self {
        self.persistence = config;
        self
    }

    pub fn with_location(mut self, location: Arc<dyn LocationBar>) -> Self {
        self.location = location;
        self
    }

    pub fn with_local_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.local_storage = storage;
        self
    }

    pub fn with_session_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.session_storage = storage;
        self
    }

    pub fn disable_url_sync(mut self) -> Self {
        self.persistence.sync_url = false;
        self
    }

    pub fn disable_expansion_sync(mut self) -> Self {
        self.persistence.sync_expansion = false;
        self
    }
}
