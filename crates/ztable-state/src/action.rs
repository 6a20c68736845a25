//! Actions accepted by the reducer

use serde::{Deserialize, Serialize};
use ztable_core::{FacetOption, Filter, Record, SortConfig};

use crate::CellRef;

/// Partial update of paging and sorting.
///
/// The page goes back to 1 unless `current_page` is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_config: Option<SortConfig>,
}

impl ParamsUpdate {
    pub fn page(page: u64) -> Self {
        Self {
            current_page: Some(page),
            ..Default::default()
        }
    }

    pub fn page_size(page_size: u64) -> Self {
        Self {
            page_size: Some(page_size),
            ..Default::default()
        }
    }

    pub fn sort(sort_config: SortConfig) -> Self {
        Self {
            sort_config: Some(sort_config),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TableAction {
    StartFetch,
    #[serde(rename_all = "camelCase")]
    FetchSuccess {
        data: Vec<Record>,
        total: u64,
        total_pages: u64,
    },
    FetchError(String),
    SetSearchTokens(Vec<String>),
    SetFilters(Vec<Filter>),
    ClearFilters,
    SyncDebouncedSearch(String),
    UpdateParams(ParamsUpdate),
    ToggleColumn(String),
    SetEditCell(Option<CellRef>),
    /// Clears the editing cell only if it is still `CellRef`
    EndEdit(CellRef),
    UpdateRow(Record),
    SetFacets {
        field: String,
        options: Option<Vec<FacetOption>>,
    },
    /// Stores looked-up options unless the field was invalidated after `revision` was read
    LoadFacets {
        field: String,
        options: Vec<FacetOption>,
        revision: u64,
    },
    ToggleRowExpansion(String),
    ExpandAll,
    CollapseAll,
    #[serde(other)]
    Unknown,
}

impl TableAction {
    pub fn name(&self) -> &'static str {
        match self {
            TableAction::StartFetch => "startFetch",
            TableAction::FetchSuccess { .. } => "fetchSuccess",
            TableAction::FetchError(_) => "fetchError",
            TableAction::SetSearchTokens(_) => "setSearchTokens",
            TableAction::SetFilters(_) => "setFilters",
            TableAction::ClearFilters => "clearFilters",
            TableAction::SyncDebouncedSearch(_) => "syncDebouncedSearch",
            TableAction::UpdateParams(_) => "updateParams",
            TableAction::ToggleColumn(_) => "toggleColumn",
            TableAction::SetEditCell(_) => "setEditCell",
            TableAction::EndEdit(_) => "endEdit",
            TableAction::UpdateRow(_) => "updateRow",
            TableAction::SetFacets { .. } => "setFacets",
            TableAction::LoadFacets { .. } => "loadFacets",
            TableAction::ToggleRowExpansion(_) => "toggleRowExpansion",
            TableAction::ExpandAll => "expandAll",
            TableAction::CollapseAll => "collapseAll",
            TableAction::Unknown => "unknown",
        }
    }
}
