//! Application configuration management.
//!
//! This module handles loading the application configuration,
//! which includes the API base URL, the optional live-update endpoint and
//! where fallback data is kept.
//!
//! Configuration is stored at `~/.config/campus-dash/config.json`. The
//! `CAMPUS_API_URL`, `CAMPUS_LIVE_URL` and `CAMPUS_DATA_DIR` environment
//! variables override the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "campus-dash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

const DEFAULT_CACHE_TTL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub live_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            live_url: None,
            data_dir: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent) and apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("CAMPUS_API_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = var("CAMPUS_LIVE_URL") {
            self.live_url = Some(url);
        }
        if let Some(dir) = var("CAMPUS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// The push endpoint, if one is configured. A blank value counts as
    /// unset.
    pub fn live_url(&self) -> Option<&str> {
        self.live_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Directory for the fallback snapshots and the log file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"live_url": "ws://campus/live"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.live_url(), Some("ws://campus/live"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CAMPUS_API_URL", "http://api.campus.edu"),
            ("CAMPUS_DATA_DIR", "/tmp/campus"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "http://api.campus.edu");
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/campus"));
        assert_eq!(config.live_url(), None);
    }

    #[test]
    fn test_blank_live_url_is_unset() {
        let config = Config {
            live_url: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.live_url(), None);
    }
}
