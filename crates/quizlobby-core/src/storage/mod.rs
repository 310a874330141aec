mod config;
pub mod seen_store;

pub use config::Config;
pub use seen_store::{SeenStore, UserMarkers};

use std::path::PathBuf;

use crate::error::StoreError;

/// Returns `~/.config/quizlobby[-dev]/` based on QUIZLOBBY_ENV.
///
/// Set QUIZLOBBY_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUIZLOBBY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quizlobby-dev")
    } else {
        base_dir.join("quizlobby")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}
