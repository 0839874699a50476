//! Session configuration.
//!
//! Loaded from `<config_dir>/docqa/config.json` when present. The backend URL
//! can be overridden with `DOCQA_API_URL`.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "docqa";
const CONFIG_FILE: &str = "config.json";
const URL_ENV: &str = "DOCQA_API_URL";
/// Lower bound for the request timeout; zero would fail every request.
const MIN_TIMEOUT_SECS: u64 = 1;

/// Default URL for a locally running backend.
pub const DEFAULT_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the analysis backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. A timed-out request counts as a transport error.
    pub request_timeout_secs: u64,
    /// Shown when the backend fails without a `detail`.
    pub generic_error_message: String,
    /// Shown as the error turn when a question never reached the backend.
    pub network_error_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            request_timeout_secs: 120,
            generic_error_message: "Something went wrong. Please try again.".to_string(),
            network_error_message: "Network error. Please try again.".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a default config pointing at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the user's config directory, then apply the
    /// environment override. Falls back to defaults if the file is missing or
    /// fails to parse.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env_override(std::env::var(URL_ENV).ok())
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config.with_valid_timeout())
    }

    /// Save the configuration to the user's config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Request timeout, never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(MIN_TIMEOUT_SECS))
    }

    fn with_valid_timeout(mut self) -> Self {
        if self.request_timeout_secs < MIN_TIMEOUT_SECS {
            tracing::warn!(
                "request_timeout_secs = {} is too short, using {}",
                self.request_timeout_secs,
                MIN_TIMEOUT_SECS
            );
            self.request_timeout_secs = MIN_TIMEOUT_SECS;
        }
        self
    }

    fn with_env_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
