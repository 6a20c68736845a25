//! In-process transport over a `DataService`

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use ztable_core::{RequestParams, ZtableError};
use ztable_server::DataService;

use crate::{ServiceError, ServiceResult, TableTransport};

/// Serves the list, update and facet endpoints straight from a [`DataService`], producing the
/// same bodies the HTTP endpoints would.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    service: Arc<DataService>,
}

impl LocalTransport {
    pub fn new(service: Arc<DataService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<DataService> {
        &self.service
    }
}

#[async_trait]
impl TableTransport for LocalTransport {
    async fn fetch_list(&self, params: &RequestParams) -> ServiceResult<Value> {
        let response = self.service.list(params)?;
        serde_json::to_value(response).map_err(|e| ServiceError::Core(ZtableError::from(e)))
    }

    async fn update_row(&self, row_id: &str, patch: &Value) -> ServiceResult<Value> {
        Ok(self.service.update(row_id, patch)?)
    }

    async fn fetch_facets(&self, field: &str, _facet_url: Option<&str>) -> ServiceResult<Vec<Value>> {
        Ok(self.service.facets(field))
    }
}
