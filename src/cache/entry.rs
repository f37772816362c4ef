//! Cache Entry Module
//!
//! Defines the structure for individual cached origin responses.

use bytes::Bytes;
use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A single cached origin response.
///
/// Entries are immutable once stored; a new fetch for the same key produces
/// a new entry that fully replaces the old one.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// HTTP status code of the origin response
    pub status: u16,
    /// Content-Type of the origin response
    pub content_type: String,
    /// Response body
    pub body: Bytes,
    /// When the entry was stored
    pub stored_at: DateTime<Utc>,
    /// Accounted size of the entry in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry from a fetched origin response.
    ///
    /// The accounted size is the body length; header overhead is ignored.
    pub fn new(status: u16, content_type: impl Into<String>, body: Bytes) -> Self {
        let size_bytes = body.len();
        Self {
            status,
            content_type: content_type.into(),
            body,
            stored_at: Utc::now(),
            size_bytes,
        }
    }
}
