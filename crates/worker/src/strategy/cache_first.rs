//! Cache-first: serve the cached shell, refetching only when it is missing.

use super::{Retrieval, RetrievalOutcome, Served};

impl Retrieval {
    /// Serve the cached index document, or fetch and cache it on a miss.
    ///
    /// A miss happens when the bucket was cleared behind the worker's back
    /// (some browsers drop caches on "clear site data" without unregistering
    /// the worker). Whatever the server answers on a miss is served, error
    /// statuses included; only a failed network call is returned as an error.
    pub async fn cache_first(&self) -> RetrievalOutcome {
        if let Some(cached) = self.read_from_cache().await {
            return Ok(Served::from_cache(cached));
        }

        let response = self.network.fetch(&self.index_request()).await?;
        self.store_in_background(response.clone());

        Ok(Served::from_network(response))
    }
}
