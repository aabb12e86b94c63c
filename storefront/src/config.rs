//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default directory for persisted collections
pub const DEFAULT_DATA_DIR: &str = "./.storefront";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "storefront=info,storefront_runtime=info";

/// Default graceful shutdown timeout in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `orders.json` and `pizzas.json`
    pub data_dir: PathBuf,
    /// Base catalog file; the bundled catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Tracing filter directives
    pub log_filter: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
    /// Install the Prometheus recorder and print a snapshot on exit
    pub metrics_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    ///
    /// Unset, empty or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            data_dir: var("STOREFRONT_DATA_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            catalog_path: var("STOREFRONT_CATALOG").map(PathBuf::from),
            log_filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            shutdown_timeout: var("STOREFRONT_SHUTDOWN_TIMEOUT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            metrics_enabled: var("STOREFRONT_METRICS")
                .is_some_and(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// Shutdown timeout as a [`Duration`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}
