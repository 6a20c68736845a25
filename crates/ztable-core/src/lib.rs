//! ZTable Core - Shared contract for the table engine
//!
//! This crate provides the types that both halves of the system agree on:
//! the client-side state engine and the server-side query engine. It defines:
//!
//! - `Record` helpers - dot-path lookup, JS-compatible text/number/date coercion
//! - `Filter` - a typed filter predicate (`field`, `operator`, `value`, `label`)
//! - `SortConfig` - single-key sort configuration
//! - `RequestParams` / `ResponseEnvelope` - the list request and response shapes
//! - `ColumnDef` / `FacetOption` - column metadata and enumerated choices

mod column;
mod error;
mod filter;
mod params;
mod record;
mod sort;

pub use column::*;
pub use error::*;
pub use filter::*;
pub use params::*;
pub use record::*;
pub use sort::*;
