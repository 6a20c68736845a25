//! One-shot table runs: open a table, let it settle, report what it shows

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use ztable_core::{ColumnDef, FacetOption, FieldType, Filter, Record, SortConfig, find_column};
use ztable_persistence::{FileStorage, MemoryLocation};
use ztable_query::QueryEngine;
use ztable_server::DataService;
use ztable_services::{
    FacetStatus, HttpTransport, LocalTransport, TableController, TableOptions, TableTransport,
};
use ztable_settings::TableSettings;
use ztable_state::TableState;

/// Where the records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A JSON array of records served in-process
    File(PathBuf),
    /// A list endpoint speaking the table protocol
    Remote {
        url: String,
        facets_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: DataSource,
    /// URL query string the table is hydrated from, e.g. `?page=2&search=sales`
    pub query: String,
    pub columns: Vec<ColumnDef>,
    /// File backing local storage (hidden columns, recent searches). In memory when unset.
    pub storage_file: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            query: String::new(),
            columns: Vec::new(),
            storage_file: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_storage_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_file = Some(path.into());
        self
    }
}

/// The settled page of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub page: u64,
    pub page_size: u64,
    pub total_rows: u64,
    pub total_pages: u64,
    pub search: String,
    pub sort: SortConfig,
    pub filters: Vec<Filter>,
    pub hidden_columns: Vec<String>,
    /// Query string that reproduces this view
    pub query: String,
    pub data: Vec<Record>,
}

impl PageReport {
    fn from_state(state: &TableState, query: String) -> Self {
        Self {
            page: state.current_page,
            page_size: state.page_size,
            total_rows: state.total_rows,
            total_pages: state.total_pages,
            search: state.debounced_search_term.clone(),
            sort: state.sort_config.clone(),
            filters: state.active_filters.clone(),
            hidden_columns: state.hidden_columns.iter().cloned().collect(),
            query,
            data: state.data.clone(),
        }
    }
}

/// Runs tables configured from [`TableSettings`]
#[derive(Debug, Clone, Default)]
pub struct TableRunner {
    settings: TableSettings,
}

impl TableRunner {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn transport(&self, source: &DataSource) -> Result<Arc<dyn TableTransport>> {
        match source {
            DataSource::File(path) => {
                let service = DataService::from_file(path)
                    .with_context(|| format!("Failed to load records from {:?}", path))?
                    .with_engine(QueryEngine::with_scope(self.settings.table.search_scope()));
                Ok(Arc::new(LocalTransport::new(Arc::new(service))))
            }
            DataSource::Remote { url, facets_url } => {
                let mut transport = HttpTransport::new(url, self.settings.fetch.request_timeout())?;
                if let Some(facets_url) = facets_url {
                    transport = transport.with_facets_base(facets_url)?;
                }
                Ok(Arc::new(transport))
            }
        }
    }

    pub fn options(&self, request: &RunRequest) -> Result<TableOptions> {
        let transport = self.transport(&request.source)?;
        let fetch = &self.settings.fetch;
        let table = &self.settings.table;

        let mut options = TableOptions::remote(transport)
            .with_persistence(self.settings.persistence_config())
            .with_columns(request.columns.clone())
            .with_id_key(table.id_key.clone())
            .with_accordion_mode(table.accordion_mode)
            .with_page_size(fetch.default_page_size)
            .with_search_debounce(fetch.search_debounce())
            .with_save_timeout(fetch.request_timeout())
            .with_location(Arc::new(MemoryLocation::new(request.query.clone())));

        if let Some(path) = &request.storage_file {
            let storage = FileStorage::open(path)
                .with_context(|| format!("Failed to open storage file {:?}", path))?;
            options = options.with_local_storage(Arc::new(storage));
        }
        Ok(options)
    }

    /// Open the table, wait for its first settled fetch and report the page
    pub async fn page(&self, request: &RunRequest) -> Result<PageReport> {
        let controller = TableController::new(self.options(request)?);
        let settled = self.wait_settled(&controller).await;
        let state = controller.state();
        let query = controller.bridge().encode(&state);
        // shutdown drops a pending debounced write
        controller.bridge().write(&state);
        controller.shutdown().await;

        settled?;
        if let Some(error) = &state.error {
            bail!("Fetch failed: {}", error);
        }
        tracing::info!(
            page = state.current_page,
            rows = state.data.len(),
            total = state.total_rows,
            "table settled"
        );
        Ok(PageReport::from_state(&state, query))
    }

    /// Resolve the option list of one field
    pub async fn facets(&self, request: &RunRequest, field: &str) -> Result<Vec<FacetOption>> {
        let mut request = request.clone();
        if find_column(&request.columns, field).is_none() {
            request.columns.push(ColumnDef::new(field, FieldType::Text));
        }

        let controller = TableController::new(self.options(&request)?);
        let status = controller.ensure_facets(field).await;
        let options = controller
            .state()
            .facet_options(field)
            .map(<[FacetOption]>::to_vec)
            .unwrap_or_default();
        controller.shutdown().await;

        match status {
            FacetStatus::Failed(message) => bail!("Facet lookup for {} failed: {}", field, message),
            status => {
                tracing::debug!(field, ?status, options = options.len(), "facets resolved");
                Ok(options)
            }
        }
    }

    async fn wait_settled(&self, controller: &TableController) -> Result<()> {
        let limit = self.settle_timeout();
        tokio::time::timeout(limit, controller.settled())
            .await
            .with_context(|| format!("Table did not settle within {:?}", limit))
    }

    fn settle_timeout(&self) -> Duration {
        self.settings.fetch.request_timeout() + self.settings.fetch.search_debounce()
    }
}
