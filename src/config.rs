//! Configuration Module
//!
//! Command-line configuration for the proxy. All values are read once at
//! process start and immutable thereafter.

use clap::Parser;

use crate::error::ConfigError;

// == Defaults ==
/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default cache capacity in bytes (100 MiB)
pub const DEFAULT_CACHE_CAPACITY_BYTES: usize = 100 * 1024 * 1024;

/// Default per-fetch timeout in milliseconds
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

// == Config ==
/// Proxy configuration parsed from command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "caching_proxy", about = "Forward HTTP caching proxy")]
pub struct Config {
    /// Base URL of the origin server to forward requests to
    #[arg(long)]
    pub origin: Option<String>,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum total size of cached response bodies in bytes
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY_BYTES)]
    pub cache_capacity_bytes: usize,

    /// Timeout for a single origin fetch in milliseconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS)]
    pub fetch_timeout_ms: u64,

    /// Clear the cache and exit instead of serving
    #[arg(long)]
    pub clear_cache: bool,
}

impl Config {
    /// Validates and normalizes the configured origin URL.
    ///
    /// The returned base URL has no trailing slash so request targets
    /// (which always start with '/') can be appended directly.
    ///
    /// # Errors
    /// - `ConfigError::MissingOrigin` if `--origin` was not supplied
    /// - `ConfigError::InvalidOrigin` if the URL does not parse as http(s)
    pub fn origin_base(&self) -> Result<String, ConfigError> {
        let raw = self.origin.as_deref().ok_or(ConfigError::MissingOrigin)?;

        let url = reqwest::Url::parse(raw)
            .map_err(|_| ConfigError::InvalidOrigin(raw.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidOrigin(raw.to_string()));
        }

        Ok(raw.trim_end_matches('/').to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: None,
            port: DEFAULT_PORT,
            cache_capacity_bytes: DEFAULT_CACHE_CAPACITY_BYTES,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            clear_cache: false,
        }
    }
}
