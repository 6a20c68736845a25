//! Mapping between `TableState` and the URL / storage channels

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use ztable_core::{SortConfig, SortDirection, parse_filters};
use ztable_state::TableState;

use crate::{
    KeyValueStorage, LocationBar, RecentSearches, build_query, get_json, parse_query, query_value,
    set_json, split_list,
};

/// URL literal meaning "every row is expanded"
pub const EXPANDED_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Read and write the location query string
    pub sync_url: bool,
    /// Persist expanded rows
    pub sync_expansion: bool,
    /// Page size omitted from the URL
    pub default_page_size: u64,
    /// Maximum expanded-row ids mirrored into the URL
    pub expanded_url_limit: usize,
    pub write_debounce: Duration,
    pub hidden_columns_key: String,
    pub expanded_state_key: String,
    pub recent_searches_key: String,
    pub recent_search_limit: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            sync_url: true,
            sync_expansion: true,
            default_page_size: 10,
            expanded_url_limit: 10,
            write_debounce: Duration::from_millis(150),
            hidden_columns_key: "dt_hidden_columns".to_string(),
            expanded_state_key: "dt_expanded_state".to_string(),
            recent_searches_key: "dt_recent_searches".to_string(),
            recent_search_limit: 5,
        }
    }
}

/// Reads the persisted view once at start-up and writes it back as the state changes
pub struct PersistenceBridge {
    location: Arc<dyn LocationBar>,
    local: Arc<dyn KeyValueStorage>,
    session: Arc<dyn KeyValueStorage>,
    config: PersistenceConfig,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistenceBridge {
    pub fn new(
        location: Arc<dyn LocationBar>,
        local: Arc<dyn KeyValueStorage>,
        session: Arc<dyn KeyValueStorage>,
        config: PersistenceConfig,
    ) -> Self {
        Self {
            location,
            local,
            session,
            config,
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    /// Recent searches backed by this bridge's local storage
    pub fn recent_searches(&self) -> RecentSearches {
        RecentSearches::load(
            Arc::clone(&self.local),
            self.config.recent_searches_key.clone(),
            self.config.recent_search_limit,
        )
    }

    /// Overlay persisted values onto `state`.
    ///
    /// URL values win over defaults. Hidden columns are the union of the URL list and local
    /// storage; expanded rows are the union of the URL prefix and session storage unless the
    /// URL says every row is expanded.
    pub fn hydrate(&self, mut state: TableState) -> TableState {
        let pairs = if self.config.sync_url {
            parse_query(&self.location.query())
        } else {
            Vec::new()
        };

        if let Some(page) = query_value(&pairs, "page").and_then(|v| v.parse::<u64>().ok()) {
            state.current_page = page.max(1);
        }
        if let Some(limit) = query_value(&pairs, "limit").and_then(|v| v.parse::<u64>().ok()) {
            state.page_size = limit.max(1);
        }
        if let Some(search) = query_value(&pairs, "search") {
            state.search_tokens = split_list(search);
            state.debounced_search_term = state.joined_search();
        }
        if let Some(sort_by) = query_value(&pairs, "sortBy").filter(|v| !v.is_empty()) {
            let direction = query_value(&pairs, "sortOrder")
                .map(SortDirection::parse)
                .unwrap_or_default();
            state.sort_config = SortConfig::new(sort_by, direction);
        }
        if let Some(filters) = query_value(&pairs, "filters") {
            match parse_filters(filters) {
                Ok(filters) => state.active_filters = filters,
                Err(e) => tracing::warn!(error = %e, "ignoring invalid filters in URL"),
            }
        }

        let mut hidden: IndexSet<String> = query_value(&pairs, "hide")
            .map(split_list)
            .unwrap_or_default()
            .into_iter()
            .collect();
        hidden.extend(self.read_list(self.local.as_ref(), &self.config.hidden_columns_key));
        state.hidden_columns = hidden;

        if self.config.sync_expansion {
            match query_value(&pairs, "expanded") {
                Some(EXPANDED_ALL) => {
                    state.all_expanded = true;
                    state.expanded_rows.clear();
                }
                url => {
                    let mut expanded: IndexSet<String> =
                        url.map(split_list).unwrap_or_default().into_iter().collect();
                    expanded.extend(
                        self.read_list(self.session.as_ref(), &self.config.expanded_state_key),
                    );
                    state.expanded_rows = expanded;
                }
            }
        }

        tracing::debug!(
            page = state.current_page,
            page_size = state.page_size,
            filters = state.active_filters.len(),
            hidden = state.hidden_columns.len(),
            expanded = state.expanded_rows.len(),
            "hydrated table state"
        );
        state
    }

    /// Query string for the shareable part of `state`. Only non-default values appear.
    pub fn encode(&self, state: &TableState) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if state.current_page > 1 {
            pairs.push(("page", state.current_page.to_string()));
        }
        if state.page_size != self.config.default_page_size {
            pairs.push(("limit", state.page_size.to_string()));
        }
        if !state.search_tokens.is_empty() {
            pairs.push(("search", state.search_tokens.join(",")));
        }
        if let Some(key) = &state.sort_config.key {
            pairs.push(("sortBy", key.clone()));
            pairs.push(("sortOrder", state.sort_config.direction.as_str().to_string()));
        }
        if !state.active_filters.is_empty() {
            match serde_json::to_string(&state.active_filters) {
                Ok(json) => pairs.push(("filters", json)),
                Err(e) => tracing::warn!(error = %e, "failed to encode filters for URL"),
            }
        }
        if !state.hidden_columns.is_empty() {
            let hidden: Vec<&str> = state.hidden_columns.iter().map(String::as_str).collect();
            pairs.push(("hide", hidden.join(",")));
        }
        if self.config.sync_expansion {
            if state.all_expanded {
                pairs.push(("expanded", EXPANDED_ALL.to_string()));
            } else if !state.expanded_rows.is_empty() {
                let prefix: Vec<&str> = state
                    .expanded_rows
                    .iter()
                    .take(self.config.expanded_url_limit)
                    .map(String::as_str)
                    .collect();
                pairs.push(("expanded", prefix.join(",")));
            }
        }

        build_query(pairs)
    }

    /// Mirror `state` into storage and the location. Storage failures are logged and ignored.
    pub fn write(&self, state: &TableState) {
        if state.hidden_columns.is_empty() {
            self.remove(self.local.as_ref(), &self.config.hidden_columns_key);
        } else {
            let hidden: Vec<&String> = state.hidden_columns.iter().collect();
            self.store(self.local.as_ref(), &self.config.hidden_columns_key, &hidden);
        }

        if self.config.sync_expansion {
            if !state.all_expanded && !state.expanded_rows.is_empty() {
                let expanded: Vec<&String> = state.expanded_rows.iter().collect();
                self.store(self.session.as_ref(), &self.config.expanded_state_key, &expanded);
            } else {
                self.remove(self.session.as_ref(), &self.config.expanded_state_key);
            }
        }

        if self.config.sync_url {
            let query = self.encode(state);
            if query != self.location.query() {
                tracing::trace!(query = %query, "replacing location query");
                self.location.replace(&query);
            }
        }
    }

    fn read_list(&self, storage: &dyn KeyValueStorage, key: &str) -> Vec<String> {
        match get_json::<Vec<String>>(storage, key) {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "ignoring unreadable storage entry");
                Vec::new()
            }
        }
    }

    fn store(&self, storage: &dyn KeyValueStorage, key: &str, values: &[&String]) {
        if let Err(e) = set_json(storage, key, values) {
            tracing::debug!(key = %key, error = %e, "storage write failed");
        }
    }

    fn remove(&self, storage: &dyn KeyValueStorage, key: &str) {
        if let Err(e) = storage.remove(key) {
            tracing::debug!(key = %key, error = %e, "storage remove failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryLocation, MemoryStorage};
    use pretty_assertions::assert_eq;
    use ztable_core::{Filter, FilterOperator};

    struct Fixture {
        location: Arc<MemoryLocation>,
        local: Arc<MemoryStorage>,
        session: Arc<MemoryStorage>,
        bridge: PersistenceBridge,
    }

    fn fixture(query: &str) -> Fixture {
        let location = Arc::new(MemoryLocation::new(query));
        let local = Arc::new(MemoryStorage::new());
        let session = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::new(
            location.clone(),
            local.clone(),
            session.clone(),
            PersistenceConfig::default(),
        );
        Fixture {
            location,
            local,
            session,
            bridge,
        }
    }

    #[test]
    fn test_default_state_encodes_to_empty_query() {
        let f = fixture("");
        assert_eq!(f.bridge.encode(&TableState::default()), "");
    }

    #[test]
    fn test_hydrate_reads_url_values() {
        let f = fixture(
            "?page=3&limit=25&search=senior,lyon&sortBy=finance.salary&sortOrder=desc\
             &filters=%5B%7B%22field%22%3A%22a%22%2C%22operator%22%3A%22is%22%2C%22value%22%3A%22b%22%7D%5D",
        );
        let state = f.bridge.hydrate(TableState::default());
        assert_eq!(state.current_page, 3);
        assert_eq!(state.page_size, 25);
        assert_eq!(state.search_tokens, vec!["senior", "lyon"]);
        assert_eq!(state.debounced_search_term, "senior lyon");
        assert_eq!(
            state.sort_config,
            SortConfig::new("finance.salary", SortDirection::Desc)
        );
        assert_eq!(state.active_filters, vec![Filter::new("a", FilterOperator::Is, "b")]);
    }

    #[test]
    fn test_invalid_filters_are_ignored() {
        let f = fixture("filters=not-json&page=2");
        let state = f.bridge.hydrate(TableState::default());
        assert!(state.active_filters.is_empty());
        assert_eq!(state.current_page, 2);
    }

    #[test]
    fn test_expanded_rows_split_between_url_and_session() {
        let f = fixture("");
        let mut state = TableState::default();
        state.expanded_rows = (1..=12).map(|i| i.to_string()).collect();

        f.bridge.write(&state);

        let pairs = parse_query(&f.location.query());
        assert_eq!(
            query_value(&pairs, "expanded"),
            Some("1,2,3,4,5,6,7,8,9,10")
        );
        let session: Vec<String> = get_json(f.session.as_ref(), "dt_expanded_state")
            .unwrap()
            .unwrap();
        assert_eq!(session.len(), 12);

        let rehydrated = fixture(&f.location.query());
        set_json(rehydrated.session.as_ref(), "dt_expanded_state", &session).unwrap();
        let restored = rehydrated.bridge.hydrate(TableState::default());
        assert_eq!(restored.expanded_rows, state.expanded_rows);
    }

    #[test]
    fn test_expand_all_uses_literal_and_clears_session() {
        let f = fixture("");
        f.session.set("dt_expanded_state", r#"["1"]"#).unwrap();
        let mut state = TableState::default();
        state.all_expanded = true;

        f.bridge.write(&state);

        assert_eq!(f.location.query(), "expanded=all");
        assert!(f.session.is_empty());
        let restored = fixture("expanded=all").bridge.hydrate(TableState::default());
        assert!(restored.all_expanded);
    }

    #[test]
    fn test_expansion_sync_can_be_disabled() {
        let location = Arc::new(MemoryLocation::new(""));
        let session = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::new(
            location.clone(),
            Arc::new(MemoryStorage::new()),
            session.clone(),
            PersistenceConfig {
                sync_expansion: false,
                ..Default::default()
            },
        );
        let mut state = TableState::default();
        state.expanded_rows.insert("5".into());
        bridge.write(&state);
        assert_eq!(location.query(), "");
        assert!(session.is_empty());
    }

    #[test]
    fn test_hidden_columns_cleared_from_local_storage() {
        let f = fixture("");
        let mut state = TableState::default();
        state.hidden_columns.insert("email".into());
        f.bridge.write(&state);
        assert!(f.local.get("dt_hidden_columns").unwrap().is_some());

        state.hidden_columns.clear();
        f.bridge.write(&state);
        assert_eq!(f.local.get("dt_hidden_columns").unwrap(), None);
    }

    #[test]
    fn test_unchanged_query_is_not_replaced() {
        let f = fixture("page=2");
        let state = f.bridge.hydrate(TableState::default());
        f.bridge.write(&state);
        assert_eq!(f.location.replacements(), 0);
    }

    #[test]
    fn test_unavailable_storage_degrades_to_url_only() {
        let location = Arc::new(MemoryLocation::new("hide=email"));
        let bridge = PersistenceBridge::new(
            location.clone(),
            Arc::new(MemoryStorage::unavailable()),
            Arc::new(MemoryStorage::unavailable()),
            PersistenceConfig::default(),
        );
        let mut state = bridge.hydrate(TableState::default());
        assert!(state.is_column_hidden("email"));
        state.expanded_rows.insert("9".into());
        bridge.write(&state);
        assert_eq!(location.query(), "hide=email&expanded=9");
    }
}
