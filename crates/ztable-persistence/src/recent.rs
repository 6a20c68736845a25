//! Recent global-search terms

use std::collections::VecDeque;
use std::sync::Arc;

use crate::{KeyValueStorage, get_json, set_json};

/// Most-recent-first list of submitted search terms, mirrored to local storage
pub struct RecentSearches {
    /// Entries (most recent first)
    entries: VecDeque<String>,
    max_entries: usize,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl std::fmt::Debug for RecentSearches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentSearches")
            .field("entries", &self.entries)
            .field("max_entries", &self.max_entries)
            .field("key", &self.key)
            .finish()
    }
}

impl RecentSearches {
    /// Load from storage. Unreadable or corrupt storage yields an empty list.
    pub fn load(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>, max_entries: usize) -> Self {
        let key = key.into();
        let entries: VecDeque<String> = match get_json::<Vec<String>>(storage.as_ref(), &key) {
            Ok(Some(saved)) => saved.into_iter().take(max_entries).collect(),
            Ok(None) => VecDeque::new(),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "ignoring unreadable recent searches");
                VecDeque::new()
            }
        };
        Self {
            entries,
            max_entries,
            storage,
            key,
        }
    }

    /// Remember a submitted term.
    ///
    /// The term is trimmed; blank terms are ignored. An existing entry that differs only in
    /// case is replaced and the term moves to the front.
    pub fn record(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let lowered = term.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.entries.push_front(term.to_string());
        while self.entries.len() > self.max_entries {
            self.entries.pop_back();
        }
        self.save();
    }

    pub fn remove(&mut self, term: &str) {
        let lowered = term.trim().to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.save();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::debug!(key = %self.key, error = %e, "failed to clear recent searches");
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) {
        let entries: Vec<&String> = self.entries.iter().collect();
        if let Err(e) = set_json(self.storage.as_ref(), &self.key, &entries) {
            tracing::debug!(key = %self.key, error = %e, "failed to persist recent searches");
        }
    }
}
