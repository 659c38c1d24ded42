//! Configuration schema

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General behavior
    #[serde(default)]
    pub general: GeneralConfig,

    /// The origin whose resources are cached
    #[serde(default)]
    pub origin: OriginConfig,

    /// Local cache behavior
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write lifecycle events to the audit log
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { audit_log: true }
    }
}

/// Origin settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Origin URL, e.g. `https://app.example.com`
    #[serde(default)]
    pub url: String,

    /// Path to the deploy manifest artifact for the current deployment
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Override the state directory holding stores and the audit log
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Concurrent fetches during bulk prefetch
    #[serde(default = "default_concurrency")]
    pub download_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            download_concurrency: default_concurrency(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

impl Config {
    /// Validate and normalize the configured origin
    ///
    /// The origin must be an absolute http(s) URL; a trailing slash is
    /// trimmed so key derivation sees a bare origin.
    pub fn origin_url(&self) -> PrecacheResult<String> {
        let url = self.origin.url.trim();
        if url.is_empty() {
            return Err(PrecacheError::OriginNotConfigured);
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(PrecacheError::User(format!(
                "Origin must be an http(s) URL, got {url:?}"
            )));
        }
        Ok(url.trim_end_matches('/').to_string())
    }
}
