//! ZTable Query - Filter, search, sort and pagination over a record collection
//!
//! The engine is pure: every operation takes a slice of records plus a query description and
//! returns a new collection. It is shared by the data service (authoritative evaluation) and by
//! the client's static-data path (local evaluation without a transport).
//!
//! ```text
//! records -> filters (AND across filters, OR across a filter's fields)
//!         -> search  (AND across whitespace tokens, substring match)
//!         -> sort    (stable, nulls last, typed comparison)
//!         -> page    (slice + meta)
//! ```

mod engine;
mod facets;
mod ordering;
mod pagination;
mod predicate;
mod search;

pub use engine::*;
pub use facets::*;
pub use ordering::*;
pub use pagination::*;
pub use predicate::*;
pub use search::*;
