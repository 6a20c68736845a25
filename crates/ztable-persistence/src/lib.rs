//! ZTable Persistence - URL and storage mirroring of table state
//!
//! Shareable state (page, page size, search, sort, filters, hidden columns and a bounded prefix
//! of expanded rows) is mirrored into a URL query string. Preferences that outlive a link are
//! kept in storage: hidden columns and recent searches in local storage, the full expanded-row
//! set in session storage.
//!
//! Storage is best effort. Every storage failure is logged and swallowed so the table keeps
//! working with URL-only or in-memory persistence.

mod bridge;
mod error;
mod location;
mod query_string;
mod recent;
mod storage;
mod writer;

pub use bridge::*;
pub use error::*;
pub use location::*;
pub use query_string::*;
pub use recent::*;
pub use storage::*;
pub use writer::*;
