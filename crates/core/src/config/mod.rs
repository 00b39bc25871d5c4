//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! List values are given in figment's array syntax, e.g.
//! `SHELLCACHE_EXCLUDE_SCOPE='["/api/.*"]'`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Retrieval strategy applied to interceptable index requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache, fetch only when the cache is empty.
    #[default]
    CacheFirst,
    /// Network first, falling back to the cache after `timeout_ms` or on failure.
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::Fallback => "fallback",
        }
    }
}

/// How the canonical index URL is derived from the worker location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexUrlMode {
    /// `index_path` resolved against `worker_url`.
    #[default]
    Path,
    /// The bare worker origin (`https://host/`), for hosts that load the shell from the origin root.
    Origin,
}

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Deployed version; the cache bucket is named `esw-index-{version}`.
    ///
    /// Set via SHELLCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Location of the worker script. Its origin is the only origin intercepted
    /// and relative index paths resolve against it.
    #[serde(default = "default_worker_url")]
    pub worker_url: String,

    /// Path of the shell document, relative to `worker_url`.
    #[serde(default = "default_index_path")]
    pub index_path: String,

    #[serde(default)]
    pub index_url_mode: IndexUrlMode,

    /// Build environment tag. `development` excludes the `/tests` runner page.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Regex patterns a request URL must match to be intercepted. Empty means everything.
    #[serde(default)]
    pub include_scope: Vec<String>,

    /// Regex patterns that are never intercepted. Wins over `include_scope`.
    #[serde(default)]
    pub exclude_scope: Vec<String>,

    #[serde(default)]
    pub strategy: Strategy,

    /// Race timeout in milliseconds for the `fallback` strategy.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fail installation when the shell cannot be fetched and stored.
    #[serde(default = "default_true")]
    pub strict_install: bool,

    /// Store 5xx responses in the cache. When off, they are still served but
    /// never replace the cached shell.
    #[serde(default = "default_true")]
    pub cache_server_errors: bool,

    /// Path to the SQLite cache database. Unset keeps the cache in memory.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes accepted for the shell document.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Hard cap on a single network request in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_version() -> String {
    "1".into()
}

fn default_worker_url() -> String {
    "http://localhost:4200/sw.js".into()
}

fn default_index_path() -> String {
    "index.html".into()
}

fn default_environment() -> String {
    "production".into()
}

fn default_timeout_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            worker_url: default_worker_url(),
            index_path: default_index_path(),
            index_url_mode: IndexUrlMode::default(),
            environment: default_environment(),
            include_scope: Vec::new(),
            exclude_scope: Vec::new(),
            strategy: Strategy::default(),
            timeout_ms: default_timeout_ms(),
            strict_install: true,
            cache_server_errors: true,
            cache_path: None,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl WorkerConfig {
    /// Fallback race timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Per-request network timeout as Duration for use with reqwest.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
