//! HTTP Transport Abstraction
//!
//! The request pipeline talks to the network exclusively through
//! [`HttpTransport`]. Hosts plug in a real client (desktop: reqwest) or a
//! fixture responder for offline development and tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(Bytes::from(json));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Parse the request body as JSON, if any.
    pub fn json_body<T: DeserializeOwned>(&self) -> Option<T> {
        self.body
            .as_ref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Build a JSON response with the given status.
    pub fn json_value(status: u16, value: &serde_json::Value) -> Self {
        let mut response = Self::new(status, value.to_string());
        response
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        response
    }

    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Native failure code reported by a transport when no HTTP response exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    /// The request did not complete within its deadline.
    Timeout,
    /// The request was cancelled by the caller.
    Aborted,
    /// TCP/TLS connection could not be established or was reset.
    Connection,
    /// Host name could not be resolved.
    Dns,
    /// Any other transport-level failure.
    Other,
}

impl TransportErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorCode::Timeout => "timeout",
            TransportErrorCode::Aborted => "aborted",
            TransportErrorCode::Connection => "connection",
            TransportErrorCode::Dns => "dns",
            TransportErrorCode::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level failure (no HTTP status available).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    pub code: TransportErrorCode,
    pub message: String,
}

impl TransportError {
    pub fn new(code: TransportErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportErrorCode::Connection, message)
    }
}

/// Async HTTP transport trait
///
/// Implementations complete with an [`HttpResponse`] for any status code the
/// server returned; status classification is the caller's job. Only failures
/// where no response exists are reported as [`TransportError`].
///
/// Dropping the returned future aborts the in-flight request. The request
/// pipeline relies on this to implement cancellation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpTransport, HttpRequest, HttpMethod};
///
/// async fn ping(transport: &dyn HttpTransport) -> bool {
///     let request = HttpRequest::new(HttpMethod::Get, "https://api.example.com/ping");
///     matches!(transport.send(request).await, Ok(r) if r.is_success())
/// }
/// ```
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and wait for the response.
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("User-Agent", "test")
            .query("lat", "39.904")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.query, vec![("lat".to_string(), "39.904".to_string())]);
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_json_body_round_trip() {
        let request = HttpRequest::new(HttpMethod::Post, "/guide")
            .json(&serde_json::json!({ "latitude": 39.9 }))
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        let body: serde_json::Value = request.json_body().unwrap();
        assert_eq!(body["latitude"], 39.9);
    }

    #[test]
    fn test_http_response_status_checks() {
        let ok = HttpResponse::new(200, "test");
        assert!(ok.is_success());
        assert!(!ok.is_client_error());
        assert!(!ok.is_server_error());

        let unavailable = HttpResponse::new(503, "");
        assert!(unavailable.is_server_error());

        let missing = HttpResponse::new(404, "");
        assert!(missing.is_client_error());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::timeout("deadline exceeded");
        assert_eq!(err.to_string(), "timeout: deadline exceeded");
        assert_eq!(err.code, TransportErrorCode::Timeout);
    }
}
