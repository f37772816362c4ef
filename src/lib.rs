//! Caching Proxy - A forward HTTP caching proxy
//!
//! Forwards requests to a single configured origin and caches GET responses
//! in a bounded LRU store, with request coalescing for concurrent misses.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod origin;
pub mod proxy;

pub use api::AppState;
pub use config::Config;
pub use proxy::ProxyCore;
