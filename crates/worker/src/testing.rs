//! Test doubles for the network and cache seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shellcache_client::{FetchRequest, Network};
use shellcache_core::{CapturedResponse, Error, MemoryCache, ResponseCache, Strategy, WorkerConfig};

use crate::settings::WorkerSettings;
use crate::strategy::Retrieval;

pub(crate) const WORKER_URL: &str = "https://app.example.com/sw.js";
pub(crate) const INDEX_URL: &str = "https://app.example.com/index.html";
pub(crate) const BUCKET: &str = "esw-index-1";

/// A network that answers every request the same way after a fixed delay.
pub(crate) struct ScriptedNetwork {
    delay: Duration,
    status: u16,
    body: Option<&'static str>,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedNetwork {
    pub(crate) fn succeeding(delay: Duration, body: &'static str) -> Self {
        Self::responding(delay, 200, body)
    }

    /// Answers with `status`; the network call itself still succeeds.
    pub(crate) fn responding(delay: Duration, status: u16, body: &'static str) -> Self {
        Self { delay, status, body: Some(body), calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn failing(delay: Duration) -> Self {
        Self { delay, status: 0, body: None, calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<FetchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<CapturedResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        tokio::time::sleep(self.delay).await;

        match self.body {
            Some(body) => Ok(CapturedResponse::new(
                request.url.as_str(),
                self.status,
                vec![("content-type".to_string(), "text/html".to_string())],
                body,
            )),
            None => Err(Error::Network(format!("{}: connection reset", request.url))),
        }
    }
}

/// Reads like `MemoryCache`, rejects every write.
#[derive(Default)]
pub(crate) struct ReadOnlyCache {
    inner: MemoryCache,
    rejected: AtomicUsize,
}

impl ReadOnlyCache {
    pub(crate) fn rejected_writes(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResponseCache for ReadOnlyCache {
    async fn match_url(&self, bucket: &str, url: &str) -> Result<Option<CapturedResponse>, Error> {
        self.inner.match_url(bucket, url).await
    }

    async fn put(&self, _bucket: &str, _url: &str, _response: &CapturedResponse) -> Result<(), Error> {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        Err(Error::CorruptEntry("quota exceeded".into()))
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.inner.bucket_names().await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        self.inner.delete_bucket(bucket).await
    }
}

/// Config for a worker at `WORKER_URL`, version 1, 3s fallback timeout.
pub(crate) fn test_config(strategy: Strategy) -> WorkerConfig {
    WorkerConfig { worker_url: WORKER_URL.into(), strategy, timeout_ms: 3_000, ..Default::default() }
}

pub(crate) fn retrieval<N, C>(strategy: Strategy, network: Arc<N>, cache: Arc<C>) -> Retrieval
where
    N: Network + 'static,
    C: ResponseCache + 'static,
{
    retrieval_with(test_config(strategy), network, cache)
}

pub(crate) fn retrieval_with<N, C>(config: WorkerConfig, network: Arc<N>, cache: Arc<C>) -> Retrieval
where
    N: Network + 'static,
    C: ResponseCache + 'static,
{
    let settings = WorkerSettings::from_config(&config).unwrap();
    Retrieval::new(Arc::new(settings), network, cache)
}

/// Seed the active bucket with an index document.
pub(crate) async fn cached(cache: &MemoryCache, body: &'static str) {
    let response = CapturedResponse::new(INDEX_URL, 200, Vec::new(), body);
    cache.put(BUCKET, INDEX_URL, &response).await.unwrap();
}

/// Give spawned cache writes a chance to run.
pub(crate) async fn settle_background() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
