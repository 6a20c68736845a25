//! Table state

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use ztable_core::{FacetOption, Filter, Record, SortConfig};

/// Identifies one cell by row primary key and field dot-path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRef {
    pub row_id: String,
    pub field_key: String,
}

impl CellRef {
    pub fn new(row_id: impl Into<String>, field_key: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            field_key: field_key.into(),
        }
    }
}

/// Per-table behavior fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOptions {
    /// Dot-path of the primary key used to merge patched rows
    pub id_key: String,
    /// At most one expanded row at a time
    pub accordion_mode: bool,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            id_key: "id".to_string(),
            accordion_mode: false,
        }
    }
}

/// The fields whose change requires a new request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryKey {
    pub page: u64,
    pub page_size: u64,
    pub sort: SortConfig,
    pub search: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    pub current_page: u64,
    pub page_size: u64,
    pub sort_config: SortConfig,
    pub search_tokens: Vec<String>,
    pub debounced_search_term: String,
    pub active_filters: Vec<Filter>,

    pub data: Vec<Record>,
    pub total_rows: u64,
    pub total_pages: u64,
    pub loading: bool,
    pub error: Option<String>,

    pub editing_cell: Option<CellRef>,
    /// `None` marks a field whose options were invalidated
    pub facet_cache: HashMap<String, Option<Vec<FacetOption>>>,
    /// Bumped every time a field's options are invalidated
    #[serde(skip)]
    pub facet_revisions: HashMap<String, u64>,

    pub hidden_columns: IndexSet<String>,
    pub expanded_rows: IndexSet<String>,
    pub all_expanded: bool,

    #[serde(skip)]
    pub options: StateOptions,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: 10,
            sort_config: SortConfig::default(),
            search_tokens: Vec::new(),
            debounced_search_term: String::new(),
            active_filters: Vec::new(),
            data: Vec::new(),
            total_rows: 0,
            total_pages: 0,
            loading: false,
            error: None,
            editing_cell: None,
            facet_cache: HashMap::new(),
            facet_revisions: HashMap::new(),
            hidden_columns: IndexSet::new(),
            expanded_rows: IndexSet::new(),
            all_expanded: false,
            options: StateOptions::default(),
        }
    }
}

impl TableState {
    pub fn new(options: StateOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Search tokens joined the way they are committed to the debounced term
    pub fn joined_search(&self) -> String {
        self.search_tokens.join(" ")
    }

    pub fn query_key(&self) -> QueryKey {
        QueryKey {
            page: self.current_page,
            page_size: self.page_size,
            sort: self.sort_config.clone(),
            search: self.debounced_search_term.clone(),
            filters: self.active_filters.clone(),
        }
    }

    /// Cached options for a field, `None` when absent or invalidated
    pub fn facet_options(&self, field: &str) -> Option<&[FacetOption]> {
        self.facet_cache.get(field).and_then(|o| o.as_deref())
    }

    pub fn facet_revision(&self, field: &str) -> u64 {
        self.facet_revisions.get(field).copied().unwrap_or(0)
    }

    pub fn is_row_expanded(&self, row_id: &str) -> bool {
        self.all_expanded || self.expanded_rows.contains(row_id)
    }

    pub fn is_column_hidden(&self, key: &str) -> bool {
        self.hidden_columns.contains(key)
    }

    pub fn is_editing(&self, cell: &CellRef) -> bool {
        self.editing_cell.as_ref() == Some(cell)
    }
}
