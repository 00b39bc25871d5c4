//! Canonical index URL resolution.
//!
//! The shell document is always cached and fetched under one URL, derived
//! once from the worker location.

use shellcache_core::IndexUrlMode;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse the worker's own location.
///
/// Only absolute http(s) URLs are accepted. The fragment is dropped.
pub fn parse_worker_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve the canonical index URL.
///
/// - `IndexUrlMode::Path`: `index_path` joined onto the worker URL, so a
///   relative path lands next to the worker script and an absolute path
///   starts at the origin root.
/// - `IndexUrlMode::Origin`: the bare origin, `scheme://host[:port]/`.
pub fn resolve_index_url(worker_url: &url::Url, mode: IndexUrlMode, index_path: &str) -> Result<url::Url, UrlError> {
    match mode {
        IndexUrlMode::Origin => {
            let origin = worker_url.origin().ascii_serialization();
            url::Url::parse(&origin).map_err(|e| UrlError::InvalidUrl(format!("{origin}: {e}")))
        }
        IndexUrlMode::Path => {
            let path = index_path.trim();
            if path.is_empty() {
                return Err(UrlError::Empty);
            }
            let mut resolved = worker_url.join(path).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
            resolved.set_fragment(None);
            Ok(resolved)
        }
    }
}
