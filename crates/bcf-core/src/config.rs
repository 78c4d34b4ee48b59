use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry and rotation parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per item (including the first).
    pub max_attempts: u32,
    /// Maximum number of proxy rotations per item.
    pub max_rotations: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            max_rotations: 5,
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            max_rotations: self.max_rotations,
            base_delay: Duration::from_millis(self.base_backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Global configuration loaded from `~/.config/bcf/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BcfConfig {
    /// Concurrent fetch workers.
    pub jobs: u32,
    /// Politeness delay between attempts per worker, in milliseconds.
    pub delay_ms: u64,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Run a single probe attempt before starting workers, to fail fast
    /// on a universally banned configuration.
    pub preflight: bool,
    /// Preferred caption languages, most preferred first.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Endpoint serving a plain-text public proxy list (one per line).
    #[serde(default)]
    pub public_pool_url: Option<String>,
    /// How many public proxies to take when the public pool is used.
    #[serde(default = "default_public_pool_count")]
    pub public_pool_count: u32,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_public_pool_count() -> u32 {
    10
}

impl Default for BcfConfig {
    fn default() -> Self {
        Self {
            jobs: 2,
            delay_ms: 0,
            timeout_secs: 20,
            preflight: true,
            languages: default_languages(),
            retry: None,
            public_pool_url: None,
            public_pool_count: default_public_pool_count(),
        }
    }
}

impl BcfConfig {
    /// Effective retry policy: the configured section or built-in defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bcf")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BcfConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BcfConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BcfConfig = toml::from_str(&data)?;
    Ok(cfg)
}
