//! Offline shell worker for single-page applications.
//!
//! Intercepts navigation requests on the worker's origin and answers them
//! with a single cached HTML shell, using either a cache-first or a
//! network-first-with-timeout strategy.

pub mod classify;
pub mod error;
pub mod host;
pub mod race;
pub mod settings;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{InterceptedRequest, is_index_request};
pub use settings::WorkerSettings;
pub use strategy::{ResponseSource, Retrieval, RetrievalOutcome, Served};
pub use worker::{EventOutcome, IndexWorker, LifecycleEvent};
