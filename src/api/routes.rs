//! API Routes
//!
//! Configures the Axum router. Every path and method falls through to the
//! proxy handler; there are no local endpoints that could shadow origin
//! paths.

use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{proxy_handler, AppState};

/// Creates the router with the catch-all proxy route.
///
/// The fallback matches every path and method, so no locally routed
/// endpoint can shadow an origin path.
///
/// # Middleware
/// - Tracing: logs all requests
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
