//! ZTable Services Layer
//!
//! This crate keeps a table's state in sync with wherever its records live. It owns the
//! asynchronous half of the system: request issuing and cancellation, search debouncing,
//! inline edits and facet lookups.
//!
//! # Architecture
//!
//! ```text
//! Caller (ztable-app, a UI)
//!     ↓ intents
//! TableController (ztable-services) ← This crate
//!     ├── FetchOrchestrator ── TableTransport (HttpTransport, LocalTransport, custom)
//!     ├── search debouncer
//!     ├── EditController ───── TableTransport / custom row updater
//!     ├── FacetCache ───────── TableTransport / custom facet fetcher
//!     └── persistence writer ─ PersistenceBridge (ztable-persistence)
//!     ↓ actions
//! TableStore (ztable-state)
//! ```
//!
//! # Services
//!
//! - [`TableController`] - One table instance, built from [`TableOptions`]
//! - [`FetchOrchestrator`] - Last-issued-wins list fetching
//! - [`EditController`] - Per-cell edit lifecycle
//! - [`FacetCache`] - Fetch-once option lists
//! - [`HttpTransport`] / [`LocalTransport`] - Transport implementations
//!
//! # Design Principles
//!
//! 1. **State changes only through the store** - services dispatch actions, never mutate
//! 2. **Cancellation is not failure** - superseded requests are dropped silently
//! 3. **Row errors stay with the row** - a failed save never sets the table error

mod controller;
mod debounce;
mod edit;
mod error;
mod facets;
mod fetch;
mod http;
mod local;
mod options;
mod transport;

pub use controller::TableController;
pub use debounce::spawn_search_debouncer;
pub use edit::{CommitOutcome, EditController, RowUpdater};
pub use error::{ServiceError, ServiceResult};
pub use facets::{FacetCache, FacetStatus};
pub use fetch::{FetchOrchestrator, FetchOutcome, ListSource, PendingFetch, spawn_fetch_reactor};
pub use http::HttpTransport;
pub use local::LocalTransport;
pub use options::{DEFAULT_SEARCH_DEBOUNCE, TableOptions};
pub use transport::{
    CustomFacetFetcher, CustomFetcher, CustomRowUpdater, RequestMapper, ResponseMapper,
    TableTransport, default_request_mapper,
};
