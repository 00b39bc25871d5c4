//! Lifecycle event dispatch.
//!
//! The host delivers `install`, `activate` and `fetch` events. Install and
//! activate run to completion inside `dispatch`; fetch either declines (the
//! host falls through to its default network handling) or hands back a
//! future that resolves to the response.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use shellcache_client::Network;
use shellcache_core::cache::cleanup_caches;
use shellcache_core::{Error, ResponseCache};

use crate::classify::{InterceptedRequest, is_index_request};
use crate::settings::WorkerSettings;
use crate::strategy::{Retrieval, RetrievalOutcome};

/// Events delivered by the host runtime.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(InterceptedRequest),
}

/// What the worker did with an event.
pub enum EventOutcome {
    /// Install or activate finished.
    Completed,
    /// The fetch is not an index request; the host should handle it itself.
    Declined,
    /// The fetch will be answered by this future.
    Respond(BoxFuture<'static, RetrievalOutcome>),
}

impl fmt::Debug for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventOutcome::Completed => f.write_str("Completed"),
            EventOutcome::Declined => f.write_str("Declined"),
            EventOutcome::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

/// The shell-caching worker: settings plus the network and cache it talks to.
#[derive(Clone)]
pub struct IndexWorker {
    retrieval: Retrieval,
}

impl IndexWorker {
    pub fn new(settings: WorkerSettings, network: Arc<dyn Network>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { retrieval: Retrieval::new(Arc::new(settings), network, cache) }
    }

    pub fn settings(&self) -> &WorkerSettings {
        self.retrieval.settings()
    }

    /// Route a lifecycle event to its handler.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<EventOutcome, Error> {
        match event {
            LifecycleEvent::Install => {
                self.install().await?;
                Ok(EventOutcome::Completed)
            }
            LifecycleEvent::Activate => {
                self.activate().await?;
                Ok(EventOutcome::Completed)
            }
            LifecycleEvent::Fetch(request) => Ok(match self.handle_fetch(&request) {
                Some(response) => EventOutcome::Respond(response),
                None => EventOutcome::Declined,
            }),
        }
    }

    /// Seed the active bucket with the index document.
    ///
    /// The response is stored whatever its status, unless it is a 5xx and
    /// `cache_server_errors` is off. With `strict_install` a failed fetch,
    /// a refused response or a failed write fails installation so
    /// the host never activates a worker with an empty cache. Otherwise the
    /// failure is logged and installation completes unseeded.
    pub async fn install(&self) -> Result<(), Error> {
        let settings = self.retrieval.settings();
        tracing::info!(bucket = %settings.cache_name, url = %settings.index_url, "installing");

        let seeded = async {
            let response = self.retrieval.network.fetch(&self.retrieval.index_request()).await?;
            if !self.retrieval.is_cacheable(&response) {
                return Err(Error::HttpError(format!(
                    "{} returned status {}; server errors are not cached",
                    settings.index_url, response.status
                )));
            }
            self.retrieval
                .cache
                .put(&settings.cache_name, settings.index_url.as_str(), &response)
                .await
        }
        .await;

        match seeded {
            Ok(()) => {
                tracing::info!(bucket = %settings.cache_name, "index cache seeded");
                Ok(())
            }
            Err(e) if settings.strict_install => {
                tracing::error!(error = %e, "install failed: could not seed index cache");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "index cache not seeded; continuing install");
                Ok(())
            }
        }
    }

    /// Delete buckets left behind by previous versions.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let settings = self.retrieval.settings();
        let deleted =
            cleanup_caches(self.retrieval.cache.as_ref(), settings.key_prefix(), &settings.cache_name).await?;
        tracing::info!(bucket = %settings.cache_name, deleted = deleted.len(), "activated");
        Ok(deleted)
    }

    /// Classify a fetch and, if it is an index request, start serving it.
    pub fn handle_fetch(&self, request: &InterceptedRequest) -> Option<BoxFuture<'static, RetrievalOutcome>> {
        if !is_index_request(request, self.retrieval.settings()) {
            return None;
        }

        tracing::debug!(
            url = %request.url,
            strategy = self.retrieval.settings().strategy.as_str(),
            "intercepting index request"
        );

        let retrieval = self.retrieval.clone();
        Some(Box::pin(async move { retrieval.retrieve().await }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ResponseSource;
    use crate::testing::{BUCKET, INDEX_URL, ScriptedNetwork, cached, test_config};
    use shellcache_core::{MemoryCache, Strategy, WorkerConfig};
    use std::time::Duration;

    fn worker_with(config: WorkerConfig, network: Arc<ScriptedNetwork>, cache: Arc<MemoryCache>) -> IndexWorker {
        let settings = WorkerSettings::from_config(&config).unwrap();
        IndexWorker::new(settings, network, cache)
    }

    fn worker(strategy: Strategy, network: Arc<ScriptedNetwork>, cache: Arc<MemoryCache>) -> IndexWorker {
        worker_with(test_config(strategy), network, cache)
    }

    fn online() -> Arc<ScriptedNetwork> {
        Arc::new(ScriptedNetwork::succeeding(Duration::ZERO, "<html>shell</html>"))
    }

    fn offline() -> Arc<ScriptedNetwork> {
        Arc::new(ScriptedNetwork::failing(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_install_seeds_cache() {
        let cache = Arc::new(MemoryCache::new());
        let network = online();
        let worker = worker(Strategy::CacheFirst, network.clone(), cache.clone());

        let outcome = worker.dispatch(LifecycleEvent::Install).await.unwrap();

        assert!(matches!(outcome, EventOutcome::Completed));
        let stored = cache.match_url(BUCKET, INDEX_URL).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"<html>shell</html>");
        assert_eq!(network.last_request().unwrap().accept, None);
    }

    #[tokio::test]
    async fn test_strict_install_fails_when_offline() {
        let cache = Arc::new(MemoryCache::new());
        let worker = worker(Strategy::CacheFirst, offline(), cache.clone());

        let result = worker.dispatch(LifecycleEvent::Install).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(cache.entry_count(BUCKET).await, 0);
    }

    #[tokio::test]
    async fn test_lenient_install_completes_when_offline() {
        let cache = Arc::new(MemoryCache::new());
        let config = WorkerConfig { strict_install: false, ..test_config(Strategy::Fallback) };
        let worker = worker_with(config, offline(), cache.clone());

        let outcome = worker.dispatch(LifecycleEvent::Install).await.unwrap();

        assert!(matches!(outcome, EventOutcome::Completed));
        assert_eq!(cache.entry_count(BUCKET).await, 0);
    }

    #[tokio::test]
    async fn test_install_stores_non_success_response() {
        let cache = Arc::new(MemoryCache::new());
        let network = Arc::new(ScriptedNetwork::responding(Duration::ZERO, 404, "<html>not found</html>"));
        let worker = worker(Strategy::CacheFirst, network, cache.clone());

        worker.install().await.unwrap();

        let stored = cache.match_url(BUCKET, INDEX_URL).await.unwrap().unwrap();
        assert_eq!(stored.status, 404);
    }

    #[tokio::test]
    async fn test_install_refuses_server_error_when_disabled() {
        let cache = Arc::new(MemoryCache::new());
        let network = Arc::new(ScriptedNetwork::responding(Duration::ZERO, 503, "down"));
        let config = WorkerConfig { cache_server_errors: false, ..test_config(Strategy::CacheFirst) };
        let strict = worker_with(config.clone(), network.clone(), cache.clone());

        assert!(matches!(strict.install().await, Err(Error::HttpError(_))));
        assert_eq!(cache.entry_count(BUCKET).await, 0);

        let lenient = worker_with(WorkerConfig { strict_install: false, ..config }, network, cache.clone());
        lenient.install().await.unwrap();
        assert_eq!(cache.entry_count(BUCKET).await, 0);
    }

    #[tokio::test]
    async fn test_activate_removes_previous_versions() {
        let cache = Arc::new(MemoryCache::new());
        let old = shellcache_core::CapturedResponse::new(INDEX_URL, 200, Vec::new(), "old");
        cache.put("esw-index-0", INDEX_URL, &old).await.unwrap();
        cache.put("esw-assets-0", INDEX_URL, &old).await.unwrap();
        cached(&cache, "<html>current</html>").await;

        let worker = worker(Strategy::CacheFirst, online(), cache.clone());
        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["esw-index-0"]);
        assert_eq!(cache.bucket_names().await.unwrap(), vec!["esw-assets-0", BUCKET]);
    }

    #[tokio::test]
    async fn test_fetch_declines_non_index_requests() {
        let worker = worker(Strategy::CacheFirst, online(), Arc::new(MemoryCache::new()));

        let post = InterceptedRequest::new("POST", "https://app.example.com/", Some("text/html"));
        let outcome = worker.dispatch(LifecycleEvent::Fetch(post)).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Declined));

        let json = InterceptedRequest::new("GET", "https://app.example.com/api/me", Some("application/json"));
        let outcome = worker.dispatch(LifecycleEvent::Fetch(json)).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Declined));
    }

    #[tokio::test]
    async fn test_fetch_after_install_serves_from_cache() {
        let network = online();
        let worker = worker(Strategy::CacheFirst, network.clone(), Arc::new(MemoryCache::new()));
        worker.dispatch(LifecycleEvent::Install).await.unwrap();
        worker.dispatch(LifecycleEvent::Activate).await.unwrap();

        let request = InterceptedRequest::navigation("https://app.example.com/");
        let EventOutcome::Respond(response) = worker.dispatch(LifecycleEvent::Fetch(request)).await.unwrap() else {
            panic!("navigation should be intercepted");
        };
        let served = response.await.unwrap();

        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(&served.response.body[..], b"<html>shell</html>");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_uses_fallback_strategy_when_configured() {
        let network = online();
        let cache = Arc::new(MemoryCache::new());
        cached(&cache, "<html>stale</html>").await;
        let worker = worker(Strategy::Fallback, network.clone(), cache);

        let request = InterceptedRequest::new("GET", "https://app.example.com/inbox", None);
        let response = worker.handle_fetch(&request).expect("request should be intercepted");
        let served = response.await.unwrap();

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(network.last_request().unwrap().accept.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_leave_one_entry() {
        let cache = Arc::new(MemoryCache::new());
        let worker = worker(Strategy::CacheFirst, online(), cache.clone());

        let responses: Vec<_> = (0..8)
            .filter_map(|i| worker.handle_fetch(&InterceptedRequest::navigation(format!("https://app.example.com/p/{i}"))))
            .collect();
        assert_eq!(responses.len(), 8);
        for response in futures_util::future::join_all(responses).await {
            assert!(response.is_ok());
        }
        crate::testing::settle_background().await;

        assert_eq!(cache.entry_count(BUCKET).await, 1);
    }
}
