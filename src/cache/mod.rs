//! Cache Module
//!
//! Provides the bounded in-memory response cache with size-aware LRU
//! eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
