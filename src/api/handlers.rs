//! API Handlers
//!
//! The single catch-all handler that feeds every inbound request through
//! the proxy core.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::IntoResponse;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::ConfigError;
use crate::origin::OriginClient;
use crate::proxy::ProxyCore;

/// Application state shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// The cache + coalescing engine
    pub core: Arc<ProxyCore>,
}

impl AppState {
    /// Creates a new AppState around an existing proxy core.
    pub fn new(core: ProxyCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the origin client and an empty cache store with the
    /// configured capacity.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base = config.origin_base()?;
        let client = OriginClient::new(base, Duration::from_millis(config.fetch_timeout_ms))?;
        let store = CacheStore::new(config.cache_capacity_bytes);
        Ok(Self::new(ProxyCore::new(client, store)))
    }
}

/// Catch-all handler for every inbound request.
///
/// Inbound headers are not forwarded; the proxy operates on method, path,
/// and query only. The response carries the `X-Cache` indicator.
pub async fn proxy_handler(State(state): State<AppState>, req: Request<Body>) -> impl IntoResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    state.core.handle(&method, &path, query.as_deref()).await
}
