//! Proxy Module
//!
//! The cache + request-coalescing engine: `CoalescingFetcher` guarantees at
//! most one origin fetch per key at a time, and `ProxyCore` orchestrates
//! lookup, fetch, store, and response shaping.

mod core;
mod fetcher;

pub use self::core::{CacheStatus, ProxyCore, ProxyResponse, X_CACHE};
pub use fetcher::{CoalescingFetcher, FetchOutcome};
