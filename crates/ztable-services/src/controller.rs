//! Table controller: one table instance wired together

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ztable_core::{ColumnDef, Filter};
use ztable_persistence::{PersistenceBridge, RecentSearches, spawn_persistence_writer};
use ztable_state::{
    CellRef, ParamsUpdate, QueryKey, StateOptions, TableAction, TableState, TableStore,
};

use crate::{
    CommitOutcome, EditController, FacetCache, FacetStatus, FetchOrchestrator, FetchOutcome,
    ListSource, RowUpdater, ServiceResult, TableOptions, TableTransport, spawn_fetch_reactor,
    spawn_search_debouncer,
};

/// Owns the store of one table and the background tasks that keep it in sync.
///
/// Construction hydrates the state from the URL and storage, then starts three tasks: the
/// fetch reactor, the search debouncer and the persistence writer. Dropping the controller
/// (or calling [`TableController::shutdown`]) stops them; pending persistence writes are
/// dropped.
///
/// Must be created inside a Tokio runtime.
pub struct TableController {
    store: TableStore,
    fetcher: Arc<FetchOrchestrator>,
    edits: EditController,
    facets: FacetCache,
    bridge: Arc<PersistenceBridge>,
    recent: Mutex<RecentSearches>,
    columns: Arc<Vec<ColumnDef>>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for TableController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableController")
            .field("store", &self.store)
            .field("fetcher", &self.fetcher)
            .field("columns", &self.columns.len())
            .finish_non_exhaustive()
    }
}

impl TableController {
    pub fn new(options: TableOptions) -> Self {
        let TableOptions {
            transport,
            static_data,
            custom_fetcher,
            custom_row_updater,
            custom_facet_fetcher,
            request_mapper,
            response_mapper,
            columns,
            id_key,
            accordion_mode,
            page_size,
            search_debounce,
            save_timeout,
            mut persistence,
            location,
            local_storage,
            session_storage,
        } = options;

        persistence.default_page_size = page_size;
        let bridge = Arc::new(PersistenceBridge::new(
            location,
            local_storage,
            session_storage,
            persistence,
        ));
        let recent = bridge.recent_searches();

        let mut initial = TableState::new(StateOptions {
            id_key,
            accordion_mode,
        })
        .with_page_size(page_size);
        initial.loading = true;
        let initial = bridge.hydrate(initial);
        let store = TableStore::new(initial);

        let columns = Arc::new(columns);
        let source = match (&static_data, custom_fetcher, &transport) {
            (Some(records), _, _) => ListSource::static_records(Arc::clone(records)),
            (None, Some(fetcher), _) => ListSource::Custom(fetcher),
            (None, None, Some(transport)) => ListSource::Remote(Arc::clone(transport)),
            (None, None, None) => ListSource::Unconfigured,
        };
        tracing::info!(source = ?source, columns = columns.len(), "table controller created");

        let fetcher = Arc::new(FetchOrchestrator::new(
            store.clone(),
            source,
            request_mapper,
            response_mapper,
        ));

        let updater = match (custom_row_updater, &transport) {
            (Some(updater), _) => RowUpdater::Custom(updater),
            (None, Some(transport)) => RowUpdater::Remote(Arc::clone(transport)),
            (None, None) => RowUpdater::Unconfigured,
        };
        let edits = EditController::new(store.clone(), Arc::clone(&columns), updater, save_timeout);

        let mut facets = FacetCache::new(store.clone(), Arc::clone(&columns));
        if let Some(transport) = transport {
            facets = facets.with_transport(transport);
        }
        if let Some(fetcher) = custom_facet_fetcher {
            facets = facets.with_custom_fetcher(fetcher);
        }
        if let Some(records) = static_data {
            facets = facets.with_static_records(records);
        }

        let shutdown = CancellationToken::new();
        let tasks = vec![
            spawn_fetch_reactor(Arc::clone(&fetcher), shutdown.child_token()),
            spawn_search_debouncer(store.clone(), search_debounce, shutdown.child_token()),
            spawn_persistence_writer(Arc::clone(&bridge), store.subscribe(), shutdown.child_token()),
        ];

        Self {
            store,
            fetcher,
            edits,
            facets,
            bridge,
            recent: Mutex::new(recent),
            columns,
            shutdown,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn state(&self) -> Arc<TableState> {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TableState>> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn bridge(&self) -> &PersistenceBridge {
        &self.bridge
    }

    // ---- search and filters ----

    pub fn set_search_tokens(&self, tokens: Vec<String>) {
        self.store.dispatch(TableAction::SetSearchTokens(tokens));
    }

    /// Add a global search term as a token and remember it as a recent search
    pub fn submit_search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        self.recent.lock().record(term);
        let state = self.store.state();
        if state.search_tokens.iter().any(|t| t == term) {
            return;
        }
        let mut tokens = state.search_tokens.clone();
        tokens.push(term.to_string());
        self.set_search_tokens(tokens);
    }

    pub fn remove_search_token(&self, index: usize) {
        let mut tokens = self.store.state().search_tokens.clone();
        if index < tokens.len() {
            tokens.remove(index);
            self.set_search_tokens(tokens);
        }
    }

    /// Recent global searches, most recent first
    pub fn recent_searches(&self) -> Vec<String> {
        self.recent.lock().entries().map(str::to_string).collect()
    }

    /// Replace the active filters. Every filter is validated first; nothing is applied when
    /// one of them is invalid.
    pub fn set_filters(&self, filters: Vec<Filter>) -> ServiceResult<()> {
        for filter in &filters {
            filter.validate()?;
        }
        self.store.dispatch(TableAction::SetFilters(filters));
        Ok(())
    }

    pub fn add_filter(&self, filter: Filter) -> ServiceResult<()> {
        let mut filters = self.store.state().active_filters.clone();
        filters.push(filter);
        self.set_filters(filters)
    }

    pub fn remove_filter(&self, index: usize) {
        let mut filters = self.store.state().active_filters.clone();
        if index < filters.len() {
            filters.remove(index);
            self.store.dispatch(TableAction::SetFilters(filters));
        }
    }

    /// Clear filters, search and row expansion
    pub fn clear_filters(&self) {
        self.store.dispatch(TableAction::ClearFilters);
    }

    // ---- paging and sorting ----

    /// Cycle the sort of a column: ascending, descending, off
    pub fn toggle_sort(&self, key: &str) {
        let next = self.store.state().sort_config.cycle(key);
        self.store.dispatch(TableAction::UpdateParams(ParamsUpdate::sort(next)));
    }

    pub fn set_page(&self, page: u64) {
        self.store.dispatch(TableAction::UpdateParams(ParamsUpdate::page(page)));
    }

    pub fn set_page_size(&self, page_size: u64) {
        self.store.dispatch(TableAction::UpdateParams(ParamsUpdate::page_size(page_size)));
    }

    // ---- columns and rows ----

    pub fn toggle_column(&self, key: &str) {
        self.store.dispatch(TableAction::ToggleColumn(key.to_string()));
    }

    pub fn toggle_row_expansion(&self, row_id: &str) {
        self.store.dispatch(TableAction::ToggleRowExpansion(row_id.to_string()));
    }

    pub fn expand_all(&self) {
        self.store.dispatch(TableAction::ExpandAll);
    }

    pub fn collapse_all(&self) {
        self.store.dispatch(TableAction::CollapseAll);
    }

    // ---- editing ----

    pub fn start_edit(&self, cell: CellRef) -> ServiceResult<()> {
        self.edits.start_edit(cell)
    }

    pub fn cancel_edit(&self, cell: &CellRef) -> bool {
        self.edits.cancel_edit(cell)
    }

    pub async fn commit_edit(&self, cell: CellRef, value: Value) -> ServiceResult<CommitOutcome> {
        self.edits.commit(cell, value).await
    }

    pub fn edits(&self) -> &EditController {
        &self.edits
    }

    pub async fn ensure_facets(&self, field: &str) -> FacetStatus {
        self.facets.ensure(field).await
    }

    // ---- fetching ----

    /// Re-issue the current request, e.g. to retry after a transport failure
    pub async fn refresh(&self) -> ServiceResult<FetchOutcome> {
        self.fetcher.refresh().await
    }

    /// Point the table at a transport, replacing whatever list source it had
    pub async fn reconfigure(&self, transport: Arc<dyn TableTransport>) -> ServiceResult<FetchOutcome> {
        self.fetcher.reconfigure(ListSource::Remote(transport));
        self.refresh().await
    }

    pub fn fetcher(&self) -> &Arc<FetchOrchestrator> {
        &self.fetcher
    }

    /// Wait until the search term has settled and the current query has been answered
    /// (successfully or not)
    pub async fn settled(&self) {
        let mut states = self.store.subscribe();
        let mut answered = self.fetcher.subscribe_settled();
        loop {
            let done = {
                let state = Arc::clone(&states.borrow_and_update());
                let key = answered.borrow_and_update().clone();
                is_settled(&state, key.as_ref())
            };
            if done {
                return;
            }
            tokio::select! {
                changed = states.changed() => if changed.is_err() { return },
                changed = answered.changed() => if changed.is_err() { return },
            }
        }
    }

    /// Stop the background tasks and wait for them to finish
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks: Vec<_> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "table task ended abnormally");
            }
        }
    }
}

impl Drop for TableController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn is_settled(state: &TableState, answered: Option<&QueryKey>) -> bool {
    !state.loading
        && state.joined_search() == state.debounced_search_term
        && answered.is_some_and(|key| *key == state.query_key())
}
