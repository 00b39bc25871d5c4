//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{IndexUrlMode, Strategy, WorkerConfig};
use crate::scope::ScopePatterns;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` or `user_agent` is empty
    /// - `worker_url` is not an absolute http(s) URL
    /// - `index_path` is empty in `path` mode
    /// - `timeout_ms` is 0 or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - a scope pattern is not a valid regular expression
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "version".into(), reason: "must not be empty".into() });
        }

        match url::Url::parse(&self.worker_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ConfigError::Invalid {
                    field: "worker_url".into(),
                    reason: format!("unsupported scheme: {}", parsed.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "worker_url".into(), reason: e.to_string() }),
        }

        if self.index_url_mode == IndexUrlMode::Path && self.index_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "index_path".into(),
                reason: "must not be empty when index_url_mode is \"path\"".into(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be greater than 0".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, patterns) in [("include_scope", &self.include_scope), ("exclude_scope", &self.exclude_scope)] {
            ScopePatterns::compile(patterns)
                .map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })?;
        }

        if self.strategy == Strategy::Fallback && self.timeout_ms >= self.request_timeout_ms {
            tracing::warn!(
                timeout_ms = self.timeout_ms,
                request_timeout_ms = self.request_timeout_ms,
                "fallback timeout is not shorter than the request timeout; \
                 the cache fallback will only be used on network errors"
            );
        }

        Ok(())
    }
}
