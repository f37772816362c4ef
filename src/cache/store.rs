//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and byte
//! accounting. The store has no knowledge of HTTP beyond the shape of the
//! entries it holds.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, LruTracker};
use crate::error::Rejected;

// == Cache Store ==
/// Bounded cache storage with size-aware LRU eviction.
///
/// Invariants:
/// - `size()` never exceeds `capacity()`
/// - every key tracked by the LRU order has exactly one stored entry and
///   vice versa
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum total size of stored bodies in bytes
    capacity_bytes: usize,
    /// Current total size of stored bodies in bytes
    current_bytes: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore bounded by the given total byte capacity.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity_bytes,
            current_bytes: 0,
        }
    }

    // == Get ==
    /// Retrieves an entry by key.
    ///
    /// On hit the key is marked most-recently-used. A miss has no side
    /// effect beyond the statistics counter.
    pub fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get(key) {
            let entry = entry.clone();
            self.lru.touch(key);
            self.stats.record_hit();
            Some(entry)
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Put ==
    /// Inserts or replaces an entry.
    ///
    /// An entry larger than the store's capacity is rejected and not
    /// stored. Otherwise least-recently-used entries are evicted until the
    /// new entry fits, then it is inserted and marked most-recently-used.
    /// Replacing an existing entry releases the old entry's bytes first.
    pub fn put(&mut self, key: CacheKey, entry: CacheEntry) -> Result<(), Rejected> {
        if entry.size_bytes > self.capacity_bytes {
            self.stats.record_rejection();
            return Err(Rejected::EntryTooLarge {
                entry_bytes: entry.size_bytes,
                capacity_bytes: self.capacity_bytes,
            });
        }

        // Full replacement: the old entry's bytes are released before
        // eviction is considered
        if let Some(old) = self.entries.remove(&key) {
            self.current_bytes -= old.size_bytes;
            self.lru.remove(&key);
        }

        // Evict until the new entry fits
        while self.current_bytes + entry.size_bytes > self.capacity_bytes {
            let Some(victim) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&victim) {
                self.current_bytes -= evicted.size_bytes;
                self.stats.record_eviction();
                debug!(key = %victim, freed_bytes = evicted.size_bytes, "evicted LRU entry");
            }
        }

        self.current_bytes += entry.size_bytes;
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.set_usage(self.entries.len(), self.current_bytes);

        Ok(())
    }

    // == Clear ==
    /// Empties the mapping, eviction order, and byte accounting.
    ///
    /// Callers serialize access through the store's outer lock, so
    /// concurrent readers observe either the pre-clear or post-clear state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.current_bytes = 0;
        self.stats.set_usage(0, 0);
    }

    // == Size ==
    /// Returns the current total size of stored bodies in bytes.
    pub fn size(&self) -> usize {
        self.current_bytes
    }

    // == Capacity ==
    /// Returns the configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity_bytes
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.entries.len(), self.current_bytes);
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn key(s: &str) -> CacheKey {
        CacheKey::from_parts(s, None)
    }

    fn entry(body: &str) -> CacheEntry {
        CacheEntry::new(200, "text/plain", Bytes::copy_from_slice(body.as_bytes()))
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(1024);
        assert_eq!(store.len(), 0);
        assert_eq!(store.size(), 0);
        assert_eq!(store.capacity(), 1024);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = CacheStore::new(1024);

        store.put(key("/a"), entry("value1")).unwrap();
        let got = store.get(&key("/a")).unwrap();

        assert_eq!(got.body.as_ref(), b"value1");
        assert_eq!(store.len(), 1);
        assert_eq!(store.size(), 6);
    }

    #[test]
    fn test_store_get_miss_has_no_side_effect() {
        let mut store = CacheStore::new(1024);

        assert!(store.get(&key("/missing")).is_none());
        assert_eq!(store.len(), 0);
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_store_replace_releases_old_bytes() {
        let mut store = CacheStore::new(1024);

        store.put(key("/a"), entry("a long first value")).unwrap();
        store.put(key("/a"), entry("short")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.size(), 5);
        assert_eq!(store.get(&key("/a")).unwrap().body.as_ref(), b"short");
    }

    #[test]
    fn test_store_rejects_oversized_entry() {
        let mut store = CacheStore::new(4);

        let result = store.put(key("/big"), entry("too large"));
        assert!(matches!(result, Err(Rejected::EntryTooLarge { .. })));
        assert!(store.is_empty());
        assert!(store.get(&key("/big")).is_none());
    }

    #[test]
    fn test_store_oversized_entry_does_not_evict() {
        let mut store = CacheStore::new(8);

        store.put(key("/a"), entry("aaaa")).unwrap();
        let result = store.put(key("/big"), entry("123456789"));

        assert!(result.is_err());
        assert!(store.get(&key("/a")).is_some());
    }

    #[test]
    fn test_store_evicts_lru_until_fit() {
        // Capacity for two 4-byte bodies
        let mut store = CacheStore::new(8);

        store.put(key("/a"), entry("aaaa")).unwrap();
        store.put(key("/b"), entry("bbbb")).unwrap();

        // Inserting /c must evict /a (least recently used)
        store.put(key("/c"), entry("cccc")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.size(), 8);
        assert!(store.get(&key("/a")).is_none());
        assert!(store.get(&key("/b")).is_some());
        assert!(store.get(&key("/c")).is_some());
    }

    #[test]
    fn test_store_eviction_repeats_for_large_entry() {
        let mut store = CacheStore::new(8);

        store.put(key("/a"), entry("aaaa")).unwrap();
        store.put(key("/b"), entry("bbbb")).unwrap();

        // 8-byte entry needs the whole capacity; both must go
        store.put(key("/c"), entry("cccccccc")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.size(), 8);
        assert!(store.get(&key("/a")).is_none());
        assert!(store.get(&key("/b")).is_none());
        assert!(store.get(&key("/c")).is_some());
    }

    #[test]
    fn test_store_get_touches_lru() {
        let mut store = CacheStore::new(8);

        store.put(key("/a"), entry("aaaa")).unwrap();
        store.put(key("/b"), entry("bbbb")).unwrap();

        // Access /a so /b becomes least recently used
        store.get(&key("/a")).unwrap();

        store.put(key("/c"), entry("cccc")).unwrap();

        assert!(store.get(&key("/a")).is_some());
        assert!(store.get(&key("/b")).is_none());
    }

    #[test]
    fn test_store_size_never_exceeds_capacity() {
        let mut store = CacheStore::new(10);

        for i in 0..50 {
            let path = format!("/item/{}", i);
            store.put(key(&path), entry("xxxx")).unwrap();
            assert!(store.size() <= store.capacity());
            assert_eq!(store.len(), store.size() / 4);
        }
    }

    #[test]
    fn test_store_clear() {
        let mut store = CacheStore::new(1024);

        store.put(key("/a"), entry("value1")).unwrap();
        store.put(key("/b"), entry("value2")).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.size(), 0);
        assert!(store.get(&key("/a")).is_none());
        assert!(store.get(&key("/b")).is_none());
    }

    #[test]
    fn test_store_put_after_clear() {
        let mut store = CacheStore::new(1024);

        store.put(key("/a"), entry("before")).unwrap();
        store.clear();
        store.put(key("/a"), entry("after")).unwrap();

        assert_eq!(store.get(&key("/a")).unwrap().body.as_ref(), b"after");
        assert_eq!(store.size(), 5);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(1024);

        store.put(key("/a"), entry("value1")).unwrap();
        store.get(&key("/a")); // hit
        store.get(&key("/missing")); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_bytes, 6);
    }

    #[test]
    fn test_store_stats_count_evictions_and_rejections() {
        let mut store = CacheStore::new(4);

        store.put(key("/a"), entry("aaaa")).unwrap();
        store.put(key("/b"), entry("bbbb")).unwrap(); // evicts /a
        let _ = store.put(key("/big"), entry("way too big")); // rejected

        let stats = store.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.rejections, 1);
    }

    #[test]
    fn test_store_entry_exactly_at_capacity() {
        let mut store = CacheStore::new(5);

        store.put(key("/a"), entry("hello")).unwrap();
        assert_eq!(store.size(), 5);
        assert!(store.get(&key("/a")).is_some());
    }
}
