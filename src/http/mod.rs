//! Thin transport abstraction between adapters and the concrete HTTP client.
//!
//! Every vendor call in this crate is a JSON POST, so the request shape is
//! deliberately minimal. Adapters depend on [`HttpTransport`] rather than on
//! reqwest directly, which keeps them testable with in-memory transports.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ProviderError;

/// JSON POST request dispatched against a vendor endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Builds a POST request carrying a serialized JSON body.
    ///
    /// `Content-Type` is set to `application/json`; adapters stamp their
    /// credential headers on top via [`HttpRequest::with_headers`].
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body,
            timeout: None,
        }
    }

    /// Merges additional headers over the defaults.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Decodes the body as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the payload is not valid UTF-8.
    pub fn into_string(self) -> Result<String, ProviderError> {
        String::from_utf8(self.body).map_err(|err| ProviderError::transport(err.to_string()))
    }
}

/// HTTP response whose body arrives incrementally (SSE feeds).
pub struct HttpStreamResponse {
    pub status: u16,
    pub body: HttpBodyStream,
}

/// Alias for the chunked body returned by [`HttpTransport::send_stream`].
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ProviderError>> + Send>>;

/// Transport seam implemented by [`reqwest::ReqwestTransport`] in production
/// and by in-memory fakes in tests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves once the full response body is buffered.
    ///
    /// # Errors
    ///
    /// Implementations map network failures to [`ProviderError::Transport`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError>;

    /// Sends a request and hands back the body as a chunk stream.
    ///
    /// # Errors
    ///
    /// Implementations map network failures to [`ProviderError::Transport`].
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, ProviderError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

pub mod reqwest;
