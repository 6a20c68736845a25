//! ZTable State - The table's single source of truth
//!
//! `TableState` is an immutable value. It only changes through [`reduce`], a pure
//! `(state, action) -> state` function, and [`TableStore`] publishes every new state to its
//! subscribers.
//!
//! ```text
//! intent ──► TableAction ──► reduce ──► Arc<TableState> ──► watch subscribers
//!                                                            (fetch, persistence, UI)
//! ```

mod action;
mod reducer;
mod state;
mod store;

pub use action::*;
pub use reducer::*;
pub use state::*;
pub use store::*;
