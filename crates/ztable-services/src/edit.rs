//! Inline cell editing
//!
//! Each cell moves through `Viewing -> Editing -> Saving -> Viewing`. Starting an edit
//! captures the current value as a baseline; committing a value equal to the baseline ends
//! the edit without touching the network. Distinct cells may save concurrently, a single cell
//! saves at most once at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use ztable_core::{
    ColumnDef, FieldType, ZtableError, find_column, get_path, parse_number, record_id,
    value_to_text, values_equal,
};
use ztable_state::{CellRef, TableAction, TableStore};

use crate::{CustomRowUpdater, ServiceError, ServiceResult, TableTransport};

/// Where row patches are sent
#[derive(Clone)]
pub enum RowUpdater {
    Custom(CustomRowUpdater),
    Remote(Arc<dyn TableTransport>),
    Unconfigured,
}

impl std::fmt::Debug for RowUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RowUpdater::Custom(_) => "custom",
            RowUpdater::Remote(_) => "remote",
            RowUpdater::Unconfigured => "unconfigured",
        })
    }
}

#[derive(Debug, Clone)]
enum CellSession {
    Editing { baseline: Value },
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The value matched the baseline; nothing was sent
    Unchanged,
    /// The row was updated; carries the record returned by the updater
    Committed(Value),
}

#[derive(Debug)]
pub struct EditController {
    store: TableStore,
    columns: Arc<Vec<ColumnDef>>,
    updater: RowUpdater,
    save_timeout: Option<Duration>,
    sessions: Mutex<HashMap<CellRef, CellSession>>,
}

impl EditController {
    pub fn new(
        store: TableStore,
        columns: Arc<Vec<ColumnDef>>,
        updater: RowUpdater,
        save_timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            columns,
            updater,
            save_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Begin editing a cell of a loaded row, superseding any other cell being edited
    pub fn start_edit(&self, cell: CellRef) -> ServiceResult<()> {
        let state = self.store.state();
        let id_key = &state.options.id_key;
        let row = state
            .data
            .iter()
            .find(|row| record_id(row, id_key).as_deref() == Some(cell.row_id.as_str()))
            .ok_or_else(|| ServiceError::Core(ZtableError::NotFound(format!("row {}", cell.row_id))))?;
        let baseline = get_path(row, &cell.field_key).cloned().unwrap_or(Value::Null);

        {
            let mut sessions = self.sessions.lock();
            if matches!(sessions.get(&cell), Some(CellSession::Saving)) {
                return Err(ServiceError::AlreadySaving(describe(&cell)));
            }
            sessions.retain(|_, session| matches!(session, CellSession::Saving));
            sessions.insert(cell.clone(), CellSession::Editing { baseline });
        }

        tracing::debug!(row = %cell.row_id, field = %cell.field_key, "edit started");
        self.store.dispatch(TableAction::SetEditCell(Some(cell)));
        Ok(())
    }

    /// Leave a cell without saving. Returns false when the cell was not being edited.
    pub fn cancel_edit(&self, cell: &CellRef) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock();
            match sessions.get(cell) {
                Some(CellSession::Editing { .. }) => sessions.remove(cell).is_some(),
                _ => false,
            }
        };
        if removed {
            self.store.dispatch(TableAction::EndEdit(cell.clone()));
        }
        removed
    }

    pub fn is_saving(&self, cell: &CellRef) -> bool {
        matches!(self.sessions.lock().get(cell), Some(CellSession::Saving))
    }

    /// Save a new value for a cell being edited.
    ///
    /// Values for `number` columns are parsed (empty and null pass through) and values for
    /// `boolean` columns become `text == "true"`. On success the returned row is merged and
    /// the facets of the patched field are invalidated. On failure the edit ends without
    /// merging and the error is returned to the caller only.
    #[tracing::instrument(skip(self, value), fields(row = %cell.row_id, field = %cell.field_key))]
    pub async fn commit(&self, cell: CellRef, value: Value) -> ServiceResult<CommitOutcome> {
        let column = find_column(&self.columns, &cell.field_key);
        let value = coerce(column, &cell.field_key, value)?;

        {
            let mut sessions = self.sessions.lock();
            let baseline = match sessions.get(&cell) {
                None => return Err(ServiceError::NotEditing(describe(&cell))),
                Some(CellSession::Saving) => return Err(ServiceError::AlreadySaving(describe(&cell))),
                Some(CellSession::Editing { baseline }) => baseline,
            };
            if values_equal(&value, baseline) {
                sessions.remove(&cell);
                drop(sessions);
                tracing::debug!("value unchanged, nothing to save");
                self.store.dispatch(TableAction::EndEdit(cell));
                return Ok(CommitOutcome::Unchanged);
            }
            sessions.insert(cell.clone(), CellSession::Saving);
        }

        let mut patch = Map::new();
        patch.insert(cell.field_key.clone(), value);
        let patch = Value::Object(patch);

        let result = self.send(&cell.row_id, patch.clone()).await;
        self.sessions.lock().remove(&cell);

        match result {
            Ok(record) => {
                self.store.dispatch(TableAction::UpdateRow(record.clone()));
                self.store.dispatch(TableAction::EndEdit(cell));
                if let Value::Object(fields) = &patch {
                    for field in fields.keys() {
                        self.store.dispatch(TableAction::SetFacets {
                            field: field.clone(),
                            options: None,
                        });
                    }
                }
                tracing::info!("cell saved");
                Ok(CommitOutcome::Committed(record))
            }
            Err(e) => {
                tracing::warn!(error = %e, "cell save failed, reverting");
                self.store.dispatch(TableAction::EndEdit(cell));
                Err(ServiceError::UpdateRejected(e.to_string()))
            }
        }
    }

    async fn send(&self, row_id: &str, patch: Value) -> ServiceResult<Value> {
        let request = async {
            match &self.updater {
                RowUpdater::Custom(update) => update(row_id.to_string(), patch).await,
                RowUpdater::Remote(transport) => transport.update_row(row_id, &patch).await,
                RowUpdater::Unconfigured => Err(ServiceError::Misconfigured(
                    "provide a transport or a custom row updater".to_string(),
                )),
            }
        };
        match self.save_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ServiceError::Transport(format!("Update timed out after {:?}", limit)))?,
            None => request.await,
        }
    }
}

fn describe(cell: &CellRef) -> String {
    format!("{}:{}", cell.row_id, cell.field_key)
}

fn coerce(column: Option<&ColumnDef>, field: &str, value: Value) -> ServiceResult<Value> {
    match column.map(|c| c.field_type) {
        Some(FieldType::Number) => match value {
            Value::Null | Value::Number(_) => Ok(value),
            Value::String(ref s) if s.trim().is_empty() => Ok(value),
            other => {
                let text = value_to_text(&other);
                let n = parse_number(&text).ok_or_else(|| ServiceError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{}' is not a number", text),
                })?;
                Ok(number_value(n))
            }
        },
        Some(FieldType::Boolean) => Ok(Value::Bool(value_to_text(&value) == "true")),
        _ => Ok(value),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
