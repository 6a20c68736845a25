//! Common test utilities and mocks

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use ztable_core::{RequestParams, ZtableError};
use ztable_server::DataService;
use ztable_services::{ServiceError, ServiceResult, TableTransport};
use ztable_state::TableState;

/// Mock transport answering from an in-memory `DataService`.
///
/// Records every request so tests can assert on what was sent, and can be scripted to delay
/// specific pages or fail on demand.
pub struct MockTransport {
    service: DataService,
    /// When set, list requests fail with `API Error: 503`
    pub should_fail: AtomicBool,
    pub fail_updates: bool,
    /// Page-specific list latency; other pages answer immediately
    pub page_delays: Vec<(u64, Duration)>,
    pub update_delay: Duration,
    pub request_log: Arc<parking_lot::Mutex<Vec<RequestParams>>>,
    pub update_log: Arc<parking_lot::Mutex<Vec<(String, Value)>>>,
    pub facet_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            service: DataService::new(records),
            should_fail: AtomicBool::new(false),
            fail_updates: false,
            page_delays: Vec::new(),
            update_delay: Duration::ZERO,
            request_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            update_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            facet_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_page_delay(mut self, page: u64, delay: Duration) -> Self {
        self.page_delays.push((page, delay));
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    pub fn with_update_failure(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    pub fn request_log(&self) -> Vec<RequestParams> {
        self.request_log.lock().clone()
    }

    pub fn requested_pages(&self) -> Vec<u64> {
        self.request_log.lock().iter().map(|p| p.page).collect()
    }

    pub fn requested_searches(&self) -> Vec<String> {
        self.request_log.lock().iter().map(|p| p.search.clone()).collect()
    }

    pub fn update_count(&self) -> usize {
        self.update_log.lock().len()
    }

    pub fn facet_count(&self, field: &str) -> usize {
        self.facet_log.lock().iter().filter(|f| f.as_str() == field).count()
    }
}

#[async_trait]
impl TableTransport for MockTransport {
    async fn fetch_list(&self, params: &RequestParams) -> ServiceResult<Value> {
        self.request_log.lock().push(params.clone());

        let delay = self
            .page_delays
            .iter()
            .find(|(page, _)| *page == params.page)
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("API Error: 503".into()));
        }
        let response = self.service.list(params)?;
        serde_json::to_value(response).map_err(|e| ServiceError::Core(ZtableError::from(e)))
    }

    async fn update_row(&self, row_id: &str, patch: &Value) -> ServiceResult<Value> {
        self.update_log.lock().push((row_id.to_string(), patch.clone()));
        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }
        if self.fail_updates {
            return Err(ServiceError::Transport("Update failed".into()));
        }
        Ok(self.service.update(row_id, patch)?)
    }

    async fn fetch_facets(&self, field: &str, _facet_url: Option<&str>) -> ServiceResult<Vec<Value>> {
        self.facet_log.lock().push(field.to_string());
        Ok(self.service.facets(field))
    }
}

/// `count` users; the first twelve work in Sales, the rest in Support
pub fn users(count: u64) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "profile": {"firstName": format!("User{}", i), "lastName": "Doe"},
                "work": {
                    "department": if i <= 12 { "Sales" } else { "Support" },
                    "title": if i % 2 == 0 { "Senior Engineer" } else { "Junior Analyst" },
                },
                "finance": {"salary": 40_000 + i * 1_000},
                "isActive": i % 3 != 0,
            })
        })
        .collect()
}

/// Ids of the rows currently shown
pub fn row_ids(state: &TableState) -> Vec<u64> {
    state.data.iter().filter_map(|row| row["id"].as_u64()).collect()
}
