//! Caching Proxy - A forward HTTP caching proxy
//!
//! Forwards requests to a single configured origin and caches GET responses
//! in a bounded LRU store, with request coalescing for concurrent misses.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::api::{create_router, AppState};
use caching_proxy::cache::CacheStore;
use caching_proxy::config::Config;

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse configuration from command-line arguments
/// 3. Handle the `--clear-cache` administrative command, if given
/// 4. Build the proxy core (origin client + cache store)
/// 5. Create the Axum router with the catch-all proxy route
/// 6. Start the HTTP server on the configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    // Administrative command: clear the cache and exit. The cache lives in
    // process memory, so clearing amounts to starting from an empty store.
    if config.clear_cache {
        let mut store = CacheStore::new(config.cache_capacity_bytes);
        store.clear();
        info!("cache cleared");
        return Ok(());
    }

    info!("Starting caching proxy");

    // Build application state; a missing or invalid origin is fatal
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    info!(
        "Configuration loaded: port={}, cache_capacity_bytes={}, fetch_timeout_ms={}",
        config.port, config.cache_capacity_bytes, config.fetch_timeout_ms
    );

    // Create the router with the catch-all proxy route
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
