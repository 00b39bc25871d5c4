//! Retrieval strategies for interceptable index requests.
//!
//! Both strategies work against the single active bucket and the canonical
//! index URL. Cache writes are spawned before the response is returned and
//! never awaited by the caller; a failed write is logged and otherwise ignored.
//!
//! Any response the server sends is served, whatever its status. With
//! `cache_server_errors` off, a 5xx is served but never written.

mod cache_first;
mod network_first;

use std::sync::Arc;

use shellcache_client::{FetchRequest, Network};
use shellcache_core::{CapturedResponse, Error, ResponseCache, Strategy};

use crate::settings::WorkerSettings;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        }
    }
}

/// A response handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: CapturedResponse,
    pub source: ResponseSource,
}

impl Served {
    fn from_cache(response: CapturedResponse) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    fn from_network(response: CapturedResponse) -> Self {
        Self { response, source: ResponseSource::Network }
    }
}

/// Either a response to serve or a failure with no fallback left.
pub type RetrievalOutcome = Result<Served, Error>;

/// Everything a strategy needs: settings plus the network and cache seams.
///
/// Cheap to clone; every field is an `Arc`.
#[derive(Clone)]
pub struct Retrieval {
    pub(crate) settings: Arc<WorkerSettings>,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) cache: Arc<dyn ResponseCache>,
}

impl Retrieval {
    pub fn new(settings: Arc<WorkerSettings>, network: Arc<dyn Network>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { settings, network, cache }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Serve a request with the configured strategy.
    pub async fn retrieve(&self) -> RetrievalOutcome {
        match self.settings.strategy {
            Strategy::CacheFirst => self.cache_first().await,
            Strategy::Fallback => self.network_first().await,
        }
    }

    /// Credentialed request for the canonical index URL.
    pub(crate) fn index_request(&self) -> FetchRequest {
        FetchRequest::new(self.settings.index_url.clone())
    }

    /// Whether a fetched response may replace the cached shell.
    pub(crate) fn is_cacheable(&self, response: &CapturedResponse) -> bool {
        cacheable(response, self.settings.cache_server_errors)
    }

    /// Read the index document from the active bucket.
    ///
    /// A failing lookup is logged and treated as a miss so the caller can
    /// still fall back to the network.
    pub(crate) async fn read_from_cache(&self) -> Option<CapturedResponse> {
        match self
            .cache
            .match_url(&self.settings.cache_name, self.settings.index_url.as_str())
            .await
        {
            Ok(Some(response)) => {
                tracing::debug!(bucket = %self.settings.cache_name, "index cache hit");
                Some(response)
            }
            Ok(None) => {
                tracing::debug!(bucket = %self.settings.cache_name, "index cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(bucket = %self.settings.cache_name, error = %e, "index cache lookup failed");
                None
            }
        }
    }

    /// Issue a cache write without waiting for it.
    pub(crate) fn store_in_background(&self, response: CapturedResponse) {
        if !self.is_cacheable(&response) {
            tracing::debug!(status = response.status, "server error response not cached");
            return;
        }
        let cache = Arc::clone(&self.cache);
        let bucket = self.settings.cache_name.clone();
        let url = self.settings.index_url.to_string();
        tokio::spawn(async move {
            store(cache.as_ref(), &bucket, &url, &response).await;
        });
    }
}

fn cacheable(response: &CapturedResponse, cache_server_errors: bool) -> bool {
    cache_server_errors || !response.is_server_error()
}

async fn store(cache: &dyn ResponseCache, bucket: &str, url: &str, response: &CapturedResponse) {
    match cache.put(bucket, url, response).await {
        Ok(()) => tracing::debug!(bucket, url, "index cache updated"),
        Err(e) => tracing::warn!(bucket, url, error = %e, "failed to update index cache"),
    }
}
