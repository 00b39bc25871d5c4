//! shellcache entry point.
//!
//! Installs and activates the worker, then answers one fetch event per stdin
//! line, concurrently. Logging goes to stderr so stdout carries only replies.

use std::sync::Arc;

use anyhow::Result;
use shellcache_client::{FetchClient, FetchConfig};
use shellcache_core::{CacheDb, MemoryCache, ResponseCache, WorkerConfig};
use shellcache_worker::{IndexWorker, LifecycleEvent, WorkerSettings, host};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    let settings = WorkerSettings::from_config(&config)?;

    let network = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.request_timeout(),
        ..Default::default()
    })?;

    let cache: Arc<dyn ResponseCache> = match &config.cache_path {
        Some(path) => Arc::new(CacheDb::open(path).await?),
        None => {
            tracing::warn!("no cache_path configured; the index cache will not survive restarts");
            Arc::new(MemoryCache::new())
        }
    };

    tracing::info!(
        version = %config.version,
        strategy = config.strategy.as_str(),
        index_url = %settings.index_url,
        "starting shellcache worker"
    );

    let worker = IndexWorker::new(settings, Arc::new(network), cache);
    worker.dispatch(LifecycleEvent::Install).await?;
    worker.dispatch(LifecycleEvent::Activate).await?;

    host::serve(&worker, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    tracing::info!("stdin closed, shutting down");

    Ok(())
}
