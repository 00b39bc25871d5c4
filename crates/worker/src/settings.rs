//! Immutable per-lifecycle worker settings.
//!
//! Built once from `WorkerConfig` and shared by every handler through an `Arc`.

use std::time::Duration;

use shellcache_client::{parse_worker_url, resolve_index_url};
use shellcache_core::cache::{CACHE_KEY_PREFIX, bucket_name};
use shellcache_core::{Error, ScopePatterns, Strategy, WorkerConfig};
use url::{Origin, Url};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Name of the active bucket, `esw-index-{version}`.
    pub cache_name: String,
    /// The single URL the shell document is fetched and cached under.
    pub index_url: Url,
    /// Origin of the worker itself; only same-origin requests are intercepted.
    pub origin: Origin,
    pub include_scope: ScopePatterns,
    pub exclude_scope: ScopePatterns,
    pub strategy: Strategy,
    pub timeout: Duration,
    pub is_development: bool,
    pub strict_install: bool,
    /// Whether 5xx responses may replace the cached shell.
    pub cache_server_errors: bool,
}

impl WorkerSettings {
    pub fn from_config(config: &WorkerConfig) -> Result<Self, Error> {
        let worker_url =
            parse_worker_url(&config.worker_url).map_err(|e| Error::InvalidUrl(format!("worker_url: {e}")))?;
        let index_url = resolve_index_url(&worker_url, config.index_url_mode, &config.index_path)
            .map_err(|e| Error::InvalidUrl(format!("index_path: {e}")))?;

        if index_url.origin() != worker_url.origin() {
            return Err(Error::Config(format!("index URL {index_url} is not on the worker origin")));
        }

        Ok(Self {
            cache_name: bucket_name(&config.version),
            index_url,
            origin: worker_url.origin(),
            include_scope: ScopePatterns::compile(&config.include_scope)?,
            exclude_scope: ScopePatterns::compile(&config.exclude_scope)?,
            strategy: config.strategy,
            timeout: config.timeout(),
            is_development: config.is_development(),
            strict_install: config.strict_install,
            cache_server_errors: config.cache_server_errors,
        })
    }

    pub fn key_prefix(&self) -> &'static str {
        CACHE_KEY_PREFIX
    }
}
