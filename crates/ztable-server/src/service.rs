//! In-memory data service

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use ztable_core::{ListResponse, RequestParams, record_id, set_path};
use ztable_query::{Query, QueryEngine, distinct_values};

use crate::{DataServiceError, DataServiceResult};

/// Fields whose facets are computed at load time
pub const PRECOMPUTED_FACET_FIELDS: &[&str] = &[
    "work.title",
    "work.department",
    "work.company",
    "work.contractType",
    "profile.nationality",
    "contact.address.city",
];

/// Keys a record may be addressed by in `update`
const ID_KEYS: [&str; 2] = ["id", "_id"];

struct Inner {
    records: Vec<Value>,
    /// Facets kept fresh across updates; other fields are computed per request
    facets: HashMap<String, Vec<Value>>,
}

/// Owns a record collection and evaluates list, update and facet requests against it.
///
/// Reads share a lock; an update holds the write lock for the mutation, the optional file
/// write and the facet refresh, so concurrent writers never observe each other's partial
/// facet state.
pub struct DataService {
    inner: RwLock<Inner>,
    engine: QueryEngine,
    data_file: Option<PathBuf>,
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("records", &self.inner.read().records.len())
            .field("data_file", &self.data_file)
            .finish()
    }
}

impl DataService {
    pub fn new(records: Vec<Value>) -> Self {
        let facets = PRECOMPUTED_FACET_FIELDS
            .iter()
            .map(|field| (field.to_string(), distinct_values(&records, field)))
            .collect();
        tracing::info!(
            records = records.len(),
            facet_fields = PRECOMPUTED_FACET_FIELDS.len(),
            "data service ready"
        );
        Self {
            inner: RwLock::new(Inner { records, facets }),
            engine: QueryEngine::new(),
            data_file: None,
        }
    }

    /// Load a JSON array of records. Updates are written back to the same file.
    pub fn from_file(path: impl AsRef<Path>) -> DataServiceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let records: Vec<Value> = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), records = records.len(), "loaded data file");
        let mut service = Self::new(records);
        service.data_file = Some(path.to_path_buf());
        Ok(service)
    }

    pub fn with_engine(mut self, engine: QueryEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Answer a list request
    #[tracing::instrument(skip(self, params), fields(page = params.page, limit = params.limit))]
    pub fn list(&self, params: &RequestParams) -> DataServiceResult<ListResponse> {
        let query = Query::from_params(params)?;
        let inner = self.inner.read();
        let response = self.engine.run(&inner.records, &query);
        tracing::debug!(
            total = response.meta.total,
            total_pages = response.meta.total_pages,
            "list evaluated"
        );
        Ok(response)
    }

    /// Apply a patch to the record whose `id` or `_id` equals `id`.
    ///
    /// Patch keys may be dot-paths; intermediate objects are created. Returns the full
    /// updated record.
    #[tracing::instrument(skip(self, patch))]
    pub fn update(&self, id: &str, patch: &Value) -> DataServiceResult<Value> {
        let Value::Object(changes) = patch else {
            return Err(DataServiceError::InvalidRequest(
                "update body must be a JSON object".to_string(),
            ));
        };

        let mut inner = self.inner.write();
        let index = inner
            .records
            .iter()
            .position(|record| {
                ID_KEYS
                    .iter()
                    .any(|key| record_id(record, key).as_deref() == Some(id))
            })
            .ok_or_else(|| DataServiceError::NotFound(id.to_string()))?;

        for (key, value) in changes {
            set_path(&mut inner.records[index], key, value.clone());
        }
        let updated = inner.records[index].clone();

        if let Some(path) = &self.data_file {
            let content = serde_json::to_string_pretty(&inner.records)?;
            fs::write(path, content)?;
        }

        for key in changes.keys() {
            let values = distinct_values(&inner.records, key);
            tracing::debug!(field = %key, values = values.len(), "recomputed facets");
            inner.facets.insert(key.clone(), values);
        }

        Ok(updated)
    }

    /// Distinct values of `field`
    pub fn facets(&self, field: &str) -> Vec<Value> {
        let inner = self.inner.read();
        if let Some(values) = inner.facets.get(field) {
            return values.clone();
        }
        distinct_values(&inner.records, field)
    }
}
