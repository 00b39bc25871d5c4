//! Network-first with a timeout fallback to the cache ("fallback" strategy).

use std::sync::Arc;

use shellcache_core::CapturedResponse;

use super::{Retrieval, RetrievalOutcome, Served, cacheable, store};
use crate::race::{Pending, Raced, race_with_timeout};

impl Retrieval {
    /// Prefer a fresh index document, bounded by the configured timeout.
    ///
    /// - fetch succeeds first: cache it in the background and serve it
    /// - fetch fails first: serve the cached copy, or surface the failure
    /// - timer fires first: serve the cached copy and let the fetch refresh
    ///   the cache when it lands; with nothing cached, wait for the fetch
    pub async fn network_first(&self) -> RetrievalOutcome {
        let network = Arc::clone(&self.network);
        let request = self.index_request().with_accept("text/html");
        let fetch = tokio::spawn(async move { network.fetch(&request).await });

        match race_with_timeout(fetch, self.settings.timeout).await {
            Raced::Finished(Ok(response)) => {
                self.store_in_background(response.clone());
                Ok(Served::from_network(response))
            }
            Raced::Finished(Err(e)) => {
                tracing::warn!(error = %e, "index fetch failed, falling back to cache");
                match self.read_from_cache().await {
                    Some(cached) => Ok(Served::from_cache(cached)),
                    None => Err(e),
                }
            }
            Raced::TimedOut(pending) => {
                tracing::debug!(timeout_ms = self.settings.timeout.as_millis() as u64, "index fetch timed out");
                match self.read_from_cache().await {
                    Some(cached) => {
                        self.drain_in_background(pending);
                        Ok(Served::from_cache(cached))
                    }
                    None => {
                        tracing::debug!("nothing cached, waiting for the original fetch");
                        let response = pending.settle().await?;
                        self.store_in_background(response.clone());
                        Ok(Served::from_network(response))
                    }
                }
            }
        }
    }

    /// Let a fetch that lost the race finish, caching a successful result.
    /// Its outcome is never delivered to a caller.
    fn drain_in_background(&self, pending: Pending<CapturedResponse>) {
        let cache = Arc::clone(&self.cache);
        let bucket = self.settings.cache_name.clone();
        let url = self.settings.index_url.to_string();
        let cache_server_errors = self.settings.cache_server_errors;
        tokio::spawn(async move {
            match pending.settle().await {
                Ok(response) if cacheable(&response, cache_server_errors) => {
                    store(cache.as_ref(), &bucket, &url, &response).await;
                }
                Ok(response) => tracing::debug!(status = response.status, "late server error response not cached"),
                Err(e) => tracing::debug!(error = %e, "late index fetch failed after serving from cache"),
            }
        });
    }
}
