//! TOML-based application configuration.
//!
//! Stores the settle delay, the managed backend URL, and the optional
//! diagnostic identity for the terminal-gate bypass.
//!
//! Configuration is stored at `~/.config/quizlobby/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::StoreError;
use crate::popup::settle::DEFAULT_SETTLE_DELAY_MS;

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/quizlobby/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Delay between a show-guard becoming true and the popup appearing.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: i64,
    /// Base URL of the managed backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Designated identity allowed to bypass the daily-gift gate for the
    /// terminal branch. Unset in the default build.
    #[serde(default)]
    pub diagnostic_user: Option<String>,
}

fn default_settle_delay_ms() -> i64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_backend_url() -> String {
    "https://api.quizlobby.app".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            backend_url: default_backend_url(),
            diagnostic_user: None,
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, StoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, StoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| StoreError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| StoreError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| StoreError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "settle_delay_ms" => Some(self.settle_delay_ms.to_string()),
            "backend_url" => Some(self.backend_url.clone()),
            "diagnostic_user" => Some(self.diagnostic_user.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Set a config value by key and persist. Returns error if the key is
    /// unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match key {
            "settle_delay_ms" => {
                self.settle_delay_ms = value.parse().map_err(|_| StoreError::SaveFailed {
                    path: PathBuf::from("config.toml"),
                    message: format!("invalid integer for settle_delay_ms: {value}"),
                })?;
            }
            "backend_url" => self.backend_url = value.to_string(),
            "diagnostic_user" => {
                self.diagnostic_user = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => {
                return Err(StoreError::SaveFailed {
                    path: PathBuf::from("config.toml"),
                    message: format!("unknown key: {key}"),
                })
            }
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.settle_delay_ms, 500);
        assert_eq!(parsed.backend_url, "https://api.quizlobby.app");
        assert!(parsed.diagnostic_user.is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.settle_delay_ms, 500);
    }

    #[test]
    fn get_known_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("settle_delay_ms").unwrap(), "500");
        assert!(cfg.get("nope").is_none());
    }
}
