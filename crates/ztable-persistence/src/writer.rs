//! Debounced background writer

use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ztable_core::{Filter, SortConfig};
use ztable_state::TableState;

use crate::PersistenceBridge;

/// The part of the state that is persisted
#[derive(Debug, Clone, PartialEq)]
struct PersistedView {
    current_page: u64,
    page_size: u64,
    search_tokens: Vec<String>,
    sort_config: SortConfig,
    active_filters: Vec<Filter>,
    hidden_columns: IndexSet<String>,
    expanded_rows: IndexSet<String>,
    all_expanded: bool,
}

impl From<&TableState> for PersistedView {
    fn from(state: &TableState) -> Self {
        Self {
            current_page: state.current_page,
            page_size: state.page_size,
            search_tokens: state.search_tokens.clone(),
            sort_config: state.sort_config.clone(),
            active_filters: state.active_filters.clone(),
            hidden_columns: state.hidden_columns.clone(),
            expanded_rows: state.expanded_rows.clone(),
            all_expanded: state.all_expanded,
        }
    }
}

/// Spawn a task that writes the persisted view after every quiet period of
/// `write_debounce`.
///
/// A change arriving inside the window restarts it, so a burst of changes produces one
/// write. Changes that leave the persisted view untouched (fetch results, loading flags) are
/// not written. Cancelling `shutdown` drops any pending write.
pub fn spawn_persistence_writer(
    bridge: Arc<PersistenceBridge>,
    mut states: watch::Receiver<Arc<TableState>>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let debounce = bridge.config().write_debounce;
    tokio::spawn(async move {
        let mut last_written = PersistedView::from(states.borrow_and_update().as_ref());

        'outer: loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let mut closed = false;
            while !closed {
                tokio::select! {
                    _ = shutdown.cancelled() => break 'outer,
                    _ = tokio::time::sleep(debounce) => break,
                    changed = states.changed() => closed = changed.is_err(),
                }
            }

            let state = Arc::clone(&states.borrow_and_update());
            let view = PersistedView::from(state.as_ref());
            if view != last_written {
                bridge.write(&state);
                last_written = view;
            }
            if closed {
                break;
            }
        }
        tracing::debug!("persistence writer stopped");
    })
}
