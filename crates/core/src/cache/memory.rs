//! In-memory cache backend.
//!
//! Used when no `cache_path` is configured. Contents die with the process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::ResponseCache;
use crate::{CapturedResponse, Error};

type Buckets = HashMap<String, HashMap<String, CapturedResponse>>;

/// Bucket map behind a tokio RwLock. Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    buckets: Arc<RwLock<Buckets>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held in `bucket`.
    pub async fn entry_count(&self, bucket: &str) -> usize {
        self.buckets.read().await.get(bucket).map_or(0, HashMap::len)
    }
}

#[async_trait::async_trait]
impl ResponseCache for MemoryCache {
    async fn match_url(&self, bucket: &str, url: &str) -> Result<Option<CapturedResponse>, Error> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(bucket).and_then(|entries| entries.get(url)).cloned())
    }

    async fn put(&self, bucket: &str, url: &str, response: &CapturedResponse) -> Result<(), Error> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), response.clone());
        Ok(())
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        let buckets = self.buckets.read().await;
        let mut names: Vec<String> = buckets
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        let mut buckets = self.buckets.write().await;
        Ok(buckets.remove(bucket).is_some_and(|entries| !entries.is_empty()))
    }
}
