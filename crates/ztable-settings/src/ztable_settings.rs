//! ZTable Settings
//!
//! File-backed settings for table instances:
//! - Fetch settings (search debounce, request timeout, page sizes)
//! - Persistence settings (URL sync, storage keys, limits)
//! - Table behavior (primary key, accordion mode, searchable fields)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use ztable_persistence::PersistenceConfig;
use ztable_query::{DEFAULT_SEARCH_FIELDS, SearchScope};

mod settings_file;

pub use settings_file::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TableSettings {
    pub fetch: FetchSettings,
    pub persistence: PersistenceSettings,
    pub table: TableBehaviorSettings,
}

impl TableSettings {
    /// Load from the default settings file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        settings_file()
    }

    pub fn persistence_config(&self) -> PersistenceConfig {
        let p = &self.persistence;
        PersistenceConfig {
            sync_url: p.sync_url,
            sync_expansion: p.sync_expansion,
            default_page_size: self.fetch.default_page_size,
            expanded_url_limit: p.expanded_url_limit,
            write_debounce: Duration::from_millis(p.url_write_debounce_ms),
            hidden_columns_key: p.hidden_columns_key.clone(),
            expanded_state_key: p.expanded_state_key.clone(),
            recent_searches_key: p.recent_searches_key.clone(),
            recent_search_limit: p.recent_search_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub search_debounce_ms: u64,
    pub request_timeout_seconds: u64,
    pub default_page_size: u64,
    pub available_page_sizes: Vec<u64>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            search_debounce_ms: 500,
            request_timeout_seconds: 30,
            default_page_size: 10,
            available_page_sizes: vec![10, 25, 50, 100],
        }
    }
}

impl FetchSettings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub url_write_debounce_ms: u64,
    pub expanded_url_limit: usize,
    pub recent_search_limit: usize,
    pub sync_url: bool,
    pub sync_expansion: bool,
    pub hidden_columns_key: String,
    pub expanded_state_key: String,
    pub recent_searches_key: String,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        let defaults = PersistenceConfig::default();
        Self {
            url_write_debounce_ms: 150,
            expanded_url_limit: defaults.expanded_url_limit,
            recent_search_limit: defaults.recent_search_limit,
            sync_url: true,
            sync_expansion: true,
            hidden_columns_key: defaults.hidden_columns_key,
            expanded_state_key: defaults.expanded_state_key,
            recent_searches_key: defaults.recent_searches_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBehaviorSettings {
    pub id_key: String,
    pub accordion_mode: bool,
    pub search_fields: Vec<String>,
}

impl Default for TableBehaviorSettings {
    fn default() -> Self {
        Self {
            id_key: "id".to_string(),
            accordion_mode: false,
            search_fields: DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl TableBehaviorSettings {
    /// Search scope for server-side evaluation. An empty field list searches every value.
    pub fn search_scope(&self) -> SearchScope {
        if self.search_fields.is_empty() {
            SearchScope::AllFields
        } else {
            SearchScope::Fields(self.search_fields.clone())
        }
    }
}
