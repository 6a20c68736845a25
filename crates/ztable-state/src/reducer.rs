//! The transition function

use std::sync::Arc;

use serde_json::Value;
use ztable_core::record_id;

use crate::{TableAction, TableState};

/// Apply one action.
///
/// Total and side-effect free. An action whose result equals the current state (an unknown
/// action, a stale facet load, re-setting a value already held) returns the same `Arc`, so callers can detect
/// no-ops with `Arc::ptr_eq`.
pub fn reduce(state: &Arc<TableState>, action: TableAction) -> Arc<TableState> {
    let mut next = TableState::clone(state);

    match action {
        TableAction::StartFetch => {
            next.loading = true;
            next.error = None;
        }
        TableAction::FetchSuccess {
            data,
            total,
            total_pages,
        } => {
            next.data = data;
            next.total_rows = total;
            next.total_pages = total_pages;
            next.loading = false;
            next.current_page = next.current_page.clamp(1, total_pages.max(1));
        }
        TableAction::FetchError(message) => {
            next.loading = false;
            next.error = Some(message);
        }
        TableAction::SetSearchTokens(tokens) => {
            next.search_tokens = tokens;
        }
        TableAction::SetFilters(filters) => {
            next.active_filters = filters;
            next.current_page = 1;
        }
        TableAction::ClearFilters => {
            next.active_filters.clear();
            next.search_tokens.clear();
            next.debounced_search_term.clear();
            next.all_expanded = false;
            next.expanded_rows.clear();
            next.current_page = 1;
        }
        TableAction::SyncDebouncedSearch(term) => {
            next.debounced_search_term = term;
            next.current_page = 1;
        }
        TableAction::UpdateParams(update) => {
            next.current_page = update.current_page.unwrap_or(1).max(1);
            if let Some(page_size) = update.page_size {
                next.page_size = page_size.max(1);
            }
            if let Some(sort_config) = update.sort_config {
                next.sort_config = sort_config;
            }
        }
        TableAction::ToggleColumn(key) => {
            if !next.hidden_columns.shift_remove(&key) {
                next.hidden_columns.insert(key);
            }
        }
        TableAction::SetEditCell(cell) => {
            next.editing_cell = cell;
        }
        TableAction::EndEdit(cell) => {
            if !state.is_editing(&cell) {
                return Arc::clone(state);
            }
            next.editing_cell = None;
        }
        TableAction::UpdateRow(patched) => {
            let Some(id) = record_id(&patched, &state.options.id_key) else {
                return Arc::clone(state);
            };
            for row in next.data.iter_mut() {
                if record_id(row, &state.options.id_key).as_deref() == Some(id.as_str()) {
                    merge_shallow(row, &patched);
                }
            }
        }
        TableAction::SetFacets { field, options } => {
            if options.is_none() {
                *next.facet_revisions.entry(field.clone()).or_insert(0) += 1;
            }
            next.facet_cache.insert(field, options);
        }
        TableAction::LoadFacets {
            field,
            options,
            revision,
        } => {
            if state.facet_revision(&field) != revision {
                return Arc::clone(state);
            }
            next.facet_cache.insert(field, Some(options));
        }
        TableAction::ToggleRowExpansion(row_id) => {
            let was_expanded = next.expanded_rows.shift_remove(&row_id);
            if !was_expanded {
                if state.options.accordion_mode {
                    next.expanded_rows.clear();
                }
                next.expanded_rows.insert(row_id);
            }
            next.all_expanded = false;
        }
        TableAction::ExpandAll => {
            next.all_expanded = true;
            next.expanded_rows.clear();
        }
        TableAction::CollapseAll => {
            next.all_expanded = false;
            next.expanded_rows.clear();
        }
        TableAction::Unknown => return Arc::clone(state),
    }

    if next == **state {
        return Arc::clone(state);
    }
    Arc::new(next)
}

/// Top-level keys of `patch` overwrite those of `row`
fn merge_shallow(row: &mut Value, patch: &Value) {
    match (row, patch) {
        (Value::Object(row), Value::Object(patch)) => {
            for (key, value) in patch {
                row.insert(key.clone(), value.clone());
            }
        }
        (row, patch) => *row = patch.clone(),
    }
}
