//! Origin Client Module
//!
//! Performs outbound fetches against the configured origin server. Holds no
//! caching logic; classification of transport failures happens here so the
//! rest of the proxy only sees `FetchError`.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{ConfigError, FetchError};

/// Content type assumed when the origin omits the header.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// == Origin Response ==
/// A complete response fetched from the origin.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Response body
    pub body: Bytes,
}

impl OriginResponse {
    /// Returns true for 2xx responses, the only ones eligible for caching.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Origin Client ==
/// Outbound HTTP client bound to a single origin base URL.
///
/// The base URL and per-fetch timeout are fixed at construction for the
/// process lifetime.
#[derive(Debug)]
pub struct OriginClient {
    /// Reqwest client with the configured timeout baked in
    http: reqwest::Client,
    /// Origin base URL without trailing slash
    base: String,
}

impl OriginClient {
    // == Constructor ==
    /// Creates a client for the given origin base URL and fetch timeout.
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base: base.into(),
        })
    }

    // == Fetch ==
    /// Issues `GET origin + path_and_query` and collects the full response.
    ///
    /// 5xx answers are classified as `FetchError::UpstreamStatus` with the
    /// payload attached, so the caller can forward them uncached. Other
    /// statuses (including 3xx/4xx) are returned as responses; cacheability
    /// is the caller's decision.
    pub async fn fetch(&self, path_and_query: &str) -> Result<OriginResponse, FetchError> {
        let url = format!("{}{}", self.base, path_and_query);
        debug!(%url, "fetching from origin");

        let response = self.http.get(&url).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let body = response.bytes().await.map_err(classify)?;

        if (500..600).contains(&status) {
            return Err(FetchError::UpstreamStatus {
                status,
                content_type,
                body,
            });
        }

        Ok(OriginResponse {
            status,
            content_type,
            body,
        })
    }

    /// Returns the origin base URL.
    pub fn base(&self) -> &str {
        &self.base
    }
}

// == Error Classification ==
/// Maps a reqwest transport error onto the fetch error taxonomy.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::ConnectionFailed(err.to_string())
    } else {
        FetchError::OriginUnreachable(err.to_string())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OriginClient {
        OriginClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hello"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("hello")
                    .insert_header("content-type", "text/plain"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.fetch("/hello").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "text/plain");
        assert_eq!(response.body.as_ref(), b"hello");
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_fetch_appends_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(wiremock::matchers::query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.fetch("/search?q=rust").await.unwrap();
        assert_eq!(response.body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn test_fetch_missing_content_type_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.fetch("/raw").await.unwrap();
        assert_eq!(response.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_fetch_4xx_returned_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.fetch("/missing").await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_fetch_5xx_is_upstream_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch("/broken").await.unwrap_err();

        match err {
            FetchError::UpstreamStatus { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body.as_ref(), b"unavailable");
            }
            other => panic!("expected UpstreamStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_failed() {
        // Nothing listens on this port
        let client =
            OriginClient::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
        let err = client.fetch("/any").await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::ConnectionFailed(_) | FetchError::OriginUnreachable(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OriginClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.fetch("/slow").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
