//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror. Fetch failures are
//! recovered at the proxy boundary and converted to HTTP error responses;
//! configuration failures are fatal at startup.

use bytes::Bytes;
use thiserror::Error;

// == Config Error Enum ==
/// Fatal configuration errors detected at process start.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No origin URL was supplied
    #[error("no origin URL provided, use --origin")]
    MissingOrigin,

    /// Origin URL could not be parsed
    #[error("invalid origin URL '{0}'")]
    InvalidOrigin(String),

    /// Outbound HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

// == Fetch Error Enum ==
/// Failure modes of a single origin fetch.
///
/// Clone is required so one outcome can be broadcast to every caller
/// coalesced on the same cache key.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// TCP/TLS connection to the origin could not be established
    #[error("connection to origin failed: {0}")]
    ConnectionFailed(String),

    /// The per-fetch timeout elapsed before the origin answered
    #[error("origin fetch timed out")]
    Timeout,

    /// The origin answered with a 5xx status; the payload is carried so it
    /// can be forwarded to the caller uncached
    #[error("origin returned upstream error status {status}")]
    UpstreamStatus {
        status: u16,
        content_type: String,
        body: Bytes,
    },

    /// Any other transport or body-read failure
    #[error("origin unreachable: {0}")]
    OriginUnreachable(String),
}

// == Rejected Error ==
/// Returned by `CacheStore::put` when an entry cannot be admitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// Entry is larger than the store's total capacity
    #[error("entry of {entry_bytes} bytes exceeds cache capacity of {capacity_bytes} bytes")]
    EntryTooLarge {
        entry_bytes: usize,
        capacity_bytes: usize,
    },
}
