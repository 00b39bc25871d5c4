//! Client code for shellcache.
//!
//! This crate provides the `Network` seam the retrieval engine fetches
//! through, its reqwest implementation, and canonical index URL resolution.

pub mod fetch;

pub use fetch::{
    FetchClient, FetchConfig, FetchRequest, Network, UrlError, parse_worker_url, resolve_index_url,
};
