//! Fetch orchestration
//!
//! Every query-affecting state change issues a new request. Each request gets a generation
//! number and a cancellation token; issuing a request cancels the previous token, and a
//! result is only committed if its generation is still the newest when it arrives. The
//! generation check and the commit happen under one lock, so a stale result can never land
//! after a newer one (last issued wins, not last returned).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ztable_core::{RequestParams, ResponseEnvelope};
use ztable_query::{Query, QueryEngine};
use ztable_state::{QueryKey, TableAction, TableStore};

use crate::transport::to_envelope;
use crate::{CustomFetcher, RequestMapper, ResponseMapper, ServiceError, ServiceResult, TableTransport};

/// Where list requests are answered
#[derive(Clone)]
pub enum ListSource {
    /// Evaluated locally: filters, search across every value and sort, all rows on one page
    Static {
        records: Arc<Vec<Value>>,
        engine: QueryEngine,
    },
    Custom(CustomFetcher),
    Remote(Arc<dyn TableTransport>),
    Unconfigured,
}

impl ListSource {
    pub fn static_records(records: Arc<Vec<Value>>) -> Self {
        ListSource::Static {
            records,
            engine: QueryEngine::all_fields(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ListSource::Static { .. } => "static",
            ListSource::Custom(_) => "custom",
            ListSource::Remote(_) => "remote",
            ListSource::Unconfigured => "unconfigured",
        }
    }
}

impl std::fmt::Debug for ListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A request that has been issued but not yet executed
#[derive(Debug)]
pub struct PendingFetch {
    pub generation: u64,
    pub params: RequestParams,
    key: QueryKey,
    token: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Committed,
    /// A newer request was issued first; the result was dropped
    Superseded,
}

pub struct FetchOrchestrator {
    store: TableStore,
    source: RwLock<ListSource>,
    request_mapper: RequestMapper,
    response_mapper: ResponseMapper,
    generation: AtomicU64,
    current: Mutex<CancellationToken>,
    commit: Mutex<()>,
    /// Query of the newest committed (or failed) request
    settled: watch::Sender<Option<QueryKey>>,
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("source", &*self.source.read())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl FetchOrchestrator {
    pub fn new(
        store: TableStore,
        source: ListSource,
        request_mapper: RequestMapper,
        response_mapper: ResponseMapper,
    ) -> Self {
        let (settled, _) = watch::channel(None);
        Self {
            store,
            source: RwLock::new(source),
            request_mapper,
            response_mapper,
            generation: AtomicU64::new(0),
            current: Mutex::new(CancellationToken::new()),
            commit: Mutex::new(()),
            settled,
        }
    }

    /// Replace the list source, e.g. after a misconfiguration
    pub fn reconfigure(&self, source: ListSource) {
        tracing::info!(source = source.name(), "list source reconfigured");
        *self.source.write() = source;
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancel whatever is in flight without issuing anything new
    pub fn cancel(&self) {
        let _commit = self.commit.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.current.lock().cancel();
    }

    /// Issue a request for the current state.
    ///
    /// Cancels the previous request and marks the table as loading. The returned handle is
    /// run with [`FetchOrchestrator::execute`].
    pub fn prepare(&self) -> PendingFetch {
        let _commit = self.commit.lock();
        let state = self.store.state();
        let params = (self.request_mapper)(&state);
        let key = state.query_key();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = std::mem::replace(&mut *self.current.lock(), token.clone());
        previous.cancel();

        self.store.dispatch(TableAction::StartFetch);
        tracing::debug!(
            generation,
            page = params.page,
            limit = params.limit,
            sort_by = %params.sort_by,
            search = %params.search,
            "fetch issued"
        );
        PendingFetch {
            generation,
            params,
            key,
            token,
        }
    }

    /// Run a prepared request and commit its result if it is still the newest.
    ///
    /// Failures are dispatched as `fetchError` (previous rows stay) and returned. A
    /// superseded request is never reported as an error.
    pub async fn execute(&self, pending: PendingFetch) -> ServiceResult<FetchOutcome> {
        let result = tokio::select! {
            biased;
            _ = pending.token.cancelled() => Err(ServiceError::Cancelled),
            result = self.load(&pending.params, &pending.token) => result,
        };
        self.commit(pending, result)
    }

    /// Issue and run a request for the current state
    pub async fn refresh(&self) -> ServiceResult<FetchOutcome> {
        let pending = self.prepare();
        self.execute(pending).await
    }

    pub fn subscribe_settled(&self) -> watch::Receiver<Option<QueryKey>> {
        self.settled.subscribe()
    }

    async fn load(&self, params: &RequestParams, token: &CancellationToken) -> ServiceResult<ResponseEnvelope> {
        let source = self.source.read().clone();
        match source {
            ListSource::Static { records, engine } => {
                let query = Query::from_params(params)?;
                let mut rows = engine.process(&records, &query.filters, &query.search);
                engine.sort(&mut rows, &query.sort);
                Ok(ResponseEnvelope {
                    total: rows.len() as u64,
                    total_pages: 1,
                    data: rows,
                })
            }
            ListSource::Custom(fetcher) => {
                let raw = fetcher(params.clone(), token.clone()).await?;
                Ok(to_envelope(&self.response_mapper, &raw))
            }
            ListSource::Remote(transport) => {
                let raw = transport.fetch_list(params).await?;
                Ok(to_envelope(&self.response_mapper, &raw))
            }
            ListSource::Unconfigured => Err(ServiceError::Misconfigured(
                "provide a transport, a custom fetcher or static data".to_string(),
            )),
        }
    }

    fn commit(
        &self,
        pending: PendingFetch,
        result: ServiceResult<ResponseEnvelope>,
    ) -> ServiceResult<FetchOutcome> {
        let _commit = self.commit.lock();
        let generation = pending.generation;
        if pending.token.is_cancelled() || generation != self.generation.load(Ordering::SeqCst) {
            tracing::debug!(generation, "fetch superseded, result discarded");
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(envelope) => {
                tracing::debug!(
                    generation,
                    rows = envelope.data.len(),
                    total = envelope.total,
                    total_pages = envelope.total_pages,
                    "fetch committed"
                );
                self.store.dispatch(TableAction::FetchSuccess {
                    data: envelope.data,
                    total: envelope.total,
                    total_pages: envelope.total_pages,
                });
                self.settled.send_replace(Some(pending.key));
                Ok(FetchOutcome::Committed)
            }
            Err(ServiceError::Cancelled) => {
                tracing::debug!(generation, "fetch cancelled");
                Ok(FetchOutcome::Superseded)
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "fetch failed");
                self.store.dispatch(TableAction::FetchError(e.to_string()));
                self.settled.send_replace(Some(pending.key));
                Err(e)
            }
        }
    }
}

/// Spawn the task that fetches once at start and again whenever the query changes
pub fn spawn_fetch_reactor(fetcher: Arc<FetchOrchestrator>, shutdown: CancellationToken) -> JoinHandle<()> {
    let mut states = fetcher.store.subscribe();
    tokio::spawn(async move {
        let mut requested = states.borrow_and_update().query_key();
        issue(&fetcher);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            let key = states.borrow_and_update().query_key();
            if key != requested {
                requested = key;
                issue(&fetcher);
            }
        }
        fetcher.cancel();
        tracing::debug!("fetch reactor stopped");
    })
}

fn issue(fetcher: &Arc<FetchOrchestrator>) {
    let pending = fetcher.prepare();
    let fetcher = Arc::clone(fetcher);
    tokio::spawn(async move {
        if let Err(e) = fetcher.execute(pending).await {
            tracing::debug!(error = %e, "background fetch ended with an error");
        }
    });
}
