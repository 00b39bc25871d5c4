//! Captured HTTP responses as stored in, and served from, a cache bucket.

use bytes::Bytes;

/// A fully buffered HTTP response.
///
/// The body is held in `Bytes`, so `clone()` yields an independent handle:
/// the copy written to the cache and the copy served to the caller never
/// share a consumable stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    /// The URL the response was fetched from (after redirects).
    pub url: String,
    pub status: u16,
    /// Header name/value pairs in the order the server sent them.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// RFC 3339 timestamp of when the response was captured.
    pub captured_at: String,
}

impl CapturedResponse {
    /// Build a response captured now.
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body: body.into(),
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Case-insensitive header lookup, returning the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 5xx: the server failed to produce the document.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}
