//! Cache Key Module
//!
//! Deterministic cache keys derived from request path and query string.

use std::fmt;

// == Cache Key ==
/// Opaque cache key for a proxied resource.
///
/// Two requests with identical path and query produce identical keys. A
/// request without a query string keys differently from one with an empty
/// query marker, matching the raw request target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    // == Constructor ==
    /// Derives a key from a request's path and optional query string.
    pub fn from_parts(path: &str, query: Option<&str>) -> Self {
        match query {
            Some(q) => CacheKey(format!("{}?{}", path, q)),
            None => CacheKey(path.to_string()),
        }
    }

    // == As Str ==
    /// Returns the key's string form, which is also the request target to
    /// append to the origin base URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
