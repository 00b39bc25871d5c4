//! Errors raised by the stdio host before a request reaches the worker.

/// Structured errors for the stdio host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The input line is not a valid request object.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::InvalidInput(err.to_string())
    }
}
