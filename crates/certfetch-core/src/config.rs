use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::executor::{FetchPolicy, DEFAULT_SERVER_ERROR_THRESHOLD};
use crate::retry::RetryPolicy;
use crate::session::{CaRoots, SessionOptions};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/certfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum concurrently open connections per session.
    pub max_total_connections: usize,
    /// Maximum concurrent connections per host (0 = uncapped).
    pub max_connections_per_host: usize,
    /// Server response errors tolerated per batch before requests stop retrying.
    #[serde(default = "default_threshold")]
    pub server_error_threshold: u32,
    /// PEM bundle used to verify servers; system roots when unset.
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
    /// Whole-request deadline in seconds; unset waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_threshold() -> u32 {
    DEFAULT_SERVER_ERROR_THRESHOLD
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_total_connections: 100,
            max_connections_per_host: 0,
            server_error_threshold: DEFAULT_SERVER_ERROR_THRESHOLD,
            ca_bundle: None,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            retry: None,
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(retry.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(retry.max_delay_secs),
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            retry: self.retry_policy(),
            server_error_threshold: self.server_error_threshold,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            ca_roots: match &self.ca_bundle {
                Some(path) => CaRoots::Bundle(path.clone()),
                None => CaRoots::System,
            },
            max_total_connections: self.max_total_connections,
            max_connections_per_host: self.max_connections_per_host,
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("certfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
