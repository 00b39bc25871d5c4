//! Versioned response cache buckets.
//!
//! A bucket is a named map of URL -> `CapturedResponse`. This module provides:
//!
//! - The `ResponseCache` trait the retrieval engine is written against
//! - A SQLite backend with async access via tokio-rusqlite
//! - An in-memory backend for ephemeral workers and tests
//! - Stale bucket cleanup on activation

pub mod connection;
pub mod entries;
pub mod lifecycle;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use lifecycle::cleanup_caches;
pub use memory::MemoryCache;

use crate::CapturedResponse;

/// Fixed prefix shared by every bucket this worker owns.
pub const CACHE_KEY_PREFIX: &str = "esw-index";

/// Name of the bucket for a deployed version: `{prefix}-{version}`.
pub fn bucket_name(version: &str) -> String {
    format!("{CACHE_KEY_PREFIX}-{version}")
}

/// Storage for versioned buckets of captured responses.
///
/// Implementations must tolerate concurrent callers. Writes to the same
/// `(bucket, url)` replace the previous entry.
#[async_trait::async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up the entry for `url` in `bucket`.
    async fn match_url(&self, bucket: &str, url: &str) -> Result<Option<CapturedResponse>, Error>;

    /// Store `response` under `url`, creating the bucket if needed.
    async fn put(&self, bucket: &str, url: &str, response: &CapturedResponse) -> Result<(), Error>;

    /// Names of all buckets holding at least one entry.
    async fn bucket_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a whole bucket. Returns whether anything was removed.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error>;
}
