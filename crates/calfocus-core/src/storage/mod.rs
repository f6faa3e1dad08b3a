mod config;
pub mod settings;

pub use config::Config;
pub use settings::{
    Account, Calendar, Credentials, FileStore, FocusState, MemoryStore, Settings, SettingsStore,
};

use std::path::PathBuf;

use crate::error::StoreError;

/// Returns `~/.config/calfocus[-dev]/` based on CALFOCUS_ENV.
///
/// Set CALFOCUS_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CALFOCUS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("calfocus-dev")
    } else {
        base_dir.join("calfocus")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}
