//! Unified error types for shellcache.
//!
//! Every message starts with a stable upper-case code so log lines and host
//! error pages can be matched without parsing the free-form detail.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the engine, the cache backends and the network client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A URL could not be parsed or resolved.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A scope pattern is not a valid regular expression.
    #[error("INVALID_PATTERN: {0}")]
    InvalidPattern(String),

    /// Transport-level network failure (DNS, connect, TLS, reset, timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The server answered with a status the cache is configured to refuse.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Response body exceeds the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// A background task panicked or was cancelled before producing a result.
    #[error("TASK_FAILED: {0}")]
    TaskFailed(String),

    /// Settings derived from configuration are unusable.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}
