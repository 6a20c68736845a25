//! Search debouncing

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use ztable_state::{TableAction, TableStore};

/// Spawn the task that commits search tokens to the debounced search term.
///
/// Every change to the tokens restarts the quiet window; other state changes leave it alone.
/// When the window elapses the tokens current at that moment are joined and committed, so a
/// superseded value is never committed. Tokens that already match the debounced term cancel
/// any pending commit.
pub fn spawn_search_debouncer(store: TableStore, window: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
    let mut states = store.subscribe();
    tokio::spawn(async move {
        let mut tokens = states.borrow_and_update().search_tokens.clone();
        let mut deadline: Option<Instant> = None;

        loop {
            let pending_commit = deadline;
            let elapsed = async move {
                match pending_commit {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    if state.search_tokens != tokens {
                        tokens = state.search_tokens.clone();
                        deadline = (state.joined_search() != state.debounced_search_term)
                            .then(|| Instant::now() + window);
                    }
                }
                _ = elapsed => {
                    deadline = None;
                    let state = store.state();
                    let term = state.joined_search();
                    if term != state.debounced_search_term {
                        tracing::debug!(term = %term, "search term settled");
                        store.dispatch(TableAction::SyncDebouncedSearch(term));
                    }
                }
            }
        }
        tracing::debug!("search debouncer stopped");
    })
}
