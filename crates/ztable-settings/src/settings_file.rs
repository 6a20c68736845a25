//! Settings file utilities

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("ztable"))
}

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .context("Could not determine data directory")
        .map(|p| p.join("ztable"))
}

pub fn settings_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

/// File-backed local storage and log files live here
pub fn storage_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("storage"))
}

pub fn logs_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("logs"))
}

pub fn ensure_directories() -> Result<()> {
    let dirs = [config_dir()?, data_dir()?, storage_dir()?, logs_dir()?];
    for dir in dirs {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        }
    }
    Ok(())
}
