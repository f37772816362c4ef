//! Proxy Core Module
//!
//! Orchestrates a single request: consult the cache, coalesce misses into
//! one origin fetch, and shape the outbound response with its cache-status
//! indicator. Holds no mutable state of its own beyond handles to the
//! shared store and in-flight registry.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStats, CacheStore};
use crate::error::FetchError;
use crate::origin::{OriginClient, OriginResponse};
use crate::proxy::CoalescingFetcher;

/// Response header carrying the cache-status indicator.
pub const X_CACHE: &str = "x-cache";

// == Cache Status ==
/// How the proxy satisfied a request, reported via `X-Cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache
    Hit,
    /// Fetched from the origin (or failed trying)
    Miss,
    /// Non-GET request forwarded without consulting the cache
    Bypass,
}

impl CacheStatus {
    /// Header value form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Proxy Response ==
/// The proxy's answer to a single inbound request.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Response body
    pub body: Bytes,
    /// Cache-status indicator
    pub cache_status: CacheStatus,
}

impl ProxyResponse {
    /// Builds a response from a fetched origin response.
    fn from_origin(response: OriginResponse, cache_status: CacheStatus) -> Self {
        Self {
            status: response.status,
            content_type: response.content_type,
            body: response.body,
            cache_status,
        }
    }

    /// Builds a response from a cached entry.
    fn from_entry(entry: CacheEntry) -> Self {
        Self {
            status: entry.status,
            content_type: entry.content_type,
            body: entry.body,
            cache_status: CacheStatus::Hit,
        }
    }

    /// Converts a fetch failure into a user-visible error response.
    ///
    /// Origin 5xx answers are forwarded verbatim; transport failures map to
    /// 502, timeouts to 504, each with a short JSON diagnostic.
    fn from_fetch_error(err: FetchError, cache_status: CacheStatus) -> Self {
        match err {
            FetchError::UpstreamStatus {
                status,
                content_type,
                body,
            } => Self {
                status,
                content_type,
                body,
                cache_status,
            },
            FetchError::Timeout => Self::error_body(504, &err.to_string(), cache_status),
            FetchError::ConnectionFailed(_) | FetchError::OriginUnreachable(_) => {
                Self::error_body(502, &err.to_string(), cache_status)
            }
        }
    }

    fn error_body(status: u16, message: &str, cache_status: CacheStatus) -> Self {
        let body = json!({ "error": message }).to_string();
        Self {
            status,
            content_type: "application/json".to_string(),
            body: Bytes::from(body),
            cache_status,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (
            status,
            [
                ("content-type", self.content_type),
                (X_CACHE, self.cache_status.as_str().to_string()),
            ],
            self.body,
        )
            .into_response()
    }
}

// == Proxy Core ==
/// Orchestrator tying the cache store, origin client, and coalescing
/// fetcher together.
pub struct ProxyCore {
    /// Shared cache store
    store: Arc<RwLock<CacheStore>>,
    /// Outbound client, used directly for cache-bypassing requests
    client: Arc<OriginClient>,
    /// Per-key fetch deduplication
    fetcher: CoalescingFetcher,
}

impl ProxyCore {
    // == Constructor ==
    /// Creates a core over the given origin client and cache store.
    pub fn new(client: OriginClient, store: CacheStore) -> Self {
        let client = Arc::new(client);
        let store = Arc::new(RwLock::new(store));
        let fetcher = CoalescingFetcher::new(Arc::clone(&client), Arc::clone(&store));
        Self {
            store,
            client,
            fetcher,
        }
    }

    // == Handle ==
    /// Handles one inbound request and produces the outbound response.
    ///
    /// Non-GET requests bypass the cache entirely. GET requests are keyed
    /// by path+query: hits are served from the store, misses go through the
    /// coalescing fetcher. Fetch failures never escape; they become error
    /// responses here.
    pub async fn handle(&self, method: &Method, path: &str, query: Option<&str>) -> ProxyResponse {
        let key = CacheKey::from_parts(path, query);
        let target = key.as_str().to_string();

        if method != Method::GET {
            info!(key = %key, %method, "cache bypass");
            return match self.client.fetch(&target).await {
                Ok(response) => ProxyResponse::from_origin(response, CacheStatus::Bypass),
                Err(err) => {
                    warn!(key = %key, %err, "origin fetch failed");
                    ProxyResponse::from_fetch_error(err, CacheStatus::Bypass)
                }
            };
        }

        if let Some(entry) = self.store.write().await.get(&key) {
            info!(key = %key, "cache hit");
            return ProxyResponse::from_entry(entry);
        }

        info!(key = %key, "cache miss");
        match self.fetcher.fetch(&key, &target).await {
            Ok(response) => ProxyResponse::from_origin(response, CacheStatus::Miss),
            Err(err) => {
                warn!(key = %key, %err, "origin fetch failed");
                ProxyResponse::from_fetch_error(err, CacheStatus::Miss)
            }
        }
    }

    // == Clear Cache ==
    /// Empties the cache store.
    ///
    /// In-flight fetch episodes are unaffected; they complete and populate
    /// the emptied store normally.
    pub async fn clear_cache(&self) {
        self.store.write().await.clear();
        info!("cache cleared");
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}
