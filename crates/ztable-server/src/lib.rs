//! ZTable Server - Authoritative data service for a record collection
//!
//! `DataService` owns the collection and answers the three endpoints the client speaks to:
//!
//! - list: filter, search, sort and paginate (`GET base?page&limit&sortBy&sortOrder&search&filters`)
//! - update: apply a dot-path patch to one record (`PUT base/<id>`)
//! - facets: distinct values of one field (`GET facets/<field>`)
//!
//! Process wiring (HTTP listener, CORS) is left to the embedding binary.

mod error;
mod list_query;
mod service;

pub use error::*;
pub use list_query::*;
pub use service::*;
