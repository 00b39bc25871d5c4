//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Response cache buckets with SQLite and in-memory backends
//! - Stale bucket cleanup
//! - URL scope matching
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod response;
pub mod scope;

pub use cache::{CacheDb, MemoryCache, ResponseCache};
pub use config::{ConfigError, IndexUrlMode, Strategy, WorkerConfig};
pub use error::Error;
pub use response::CapturedResponse;
pub use scope::ScopePatterns;
