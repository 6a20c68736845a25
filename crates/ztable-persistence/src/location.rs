//! The address bar the table mirrors its state into

use parking_lot::Mutex;

/// Read and replace the current location's query string (without the leading `?`).
///
/// `replace` must not add a history entry.
pub trait LocationBar: Send + Sync {
    fn query(&self) -> String;
    fn replace(&self, query: &str);
}

/// In-process location, also recording how many replacements happened
#[derive(Debug, Default)]
pub struct MemoryLocation {
    query: Mutex<String>,
    replacements: Mutex<usize>,
}

impl MemoryLocation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(query.into().trim_start_matches('?').to_string()),
            replacements: Mutex::new(0),
        }
    }

    pub fn replacements(&self) -> usize {
        *self.replacements.lock()
    }
}

impl LocationBar for MemoryLocation {
    fn query(&self) -> String {
        self.query.lock().clone()
    }

    fn replace(&self, query: &str) {
        *self.query.lock() = query.to_string();
        *self.replacements.lock() += 1;
    }
}
