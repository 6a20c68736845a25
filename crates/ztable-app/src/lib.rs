//! ZTable App - headless runner for the table engine
//!
//! Opens a table over a JSON record file (served in-process) or a remote list endpoint,
//! hydrates it from a URL query string and reports the settled page or a field's facets.

pub mod args;
pub mod logging;
pub mod runner;

pub use runner::{DataSource, PageReport, RunRequest, TableRunner};
