//! API Module
//!
//! HTTP surface of the proxy: a single catch-all route that forwards every
//! request through `ProxyCore` and stamps the `X-Cache` header.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
