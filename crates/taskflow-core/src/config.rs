//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the request timeout, and the last used
//! username.
//!
//! Configuration is stored at `~/.config/taskflow/config.json`; the session
//! lives in the cache directory next to it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "taskflow";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured API base URL
pub const API_URL_ENV: &str = "TASKFLOW_API_URL";

/// Backend used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://taskflowapp-production.up.railway.app";

/// HTTP request timeout in seconds.
/// Requests otherwise have no deadline of their own.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub last_username: Option<String>,
    /// Set from the command line for one run; never written to disk.
    #[serde(skip)]
    pub api_url_override: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL: command-line override, then `TASKFLOW_API_URL`, then the file.
    pub fn api_base_url(&self) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        let preferred = self.api_url_override.clone().or(env);
        resolve_base_url(preferred, self.api_base_url.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

fn resolve_base_url(preferred: Option<String>, configured: Option<&str>) -> String {
    preferred.as_deref()
        .into_iter()
        .chain(configured)
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .trim_end_matches('/')
        .to_string()
}
