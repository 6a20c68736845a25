//! Observable store around the reducer

use std::sync::Arc;

use tokio::sync::watch;

use crate::{TableAction, TableState, reduce};

/// Holds the current `TableState` and publishes every change.
///
/// Dispatch is synchronous and serialized by the channel's lock, so two reducer applications
/// never interleave. Cloning the store yields another handle to the same state.
#[derive(Clone)]
pub struct TableStore {
    sender: Arc<watch::Sender<Arc<TableState>>>,
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStore")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

impl TableStore {
    pub fn new(initial: TableState) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Arc<TableState> {
        Arc::clone(&self.sender.borrow())
    }

    /// Apply an action and publish the result. Subscribers are only woken when the state
    /// actually changed.
    pub fn dispatch(&self, action: TableAction) -> Arc<TableState> {
        let name = action.name();
        let mut published = None;
        let changed = self.sender.send_if_modified(|current| {
            let next = reduce(current, action);
            if Arc::ptr_eq(&next, current) {
                return false;
            }
            *current = Arc::clone(&next);
            published = Some(next);
            true
        });
        tracing::trace!(action = name, changed, "dispatched");
        published.unwrap_or_else(|| self.state())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TableState>> {
        self.sender.subscribe()
    }
}
