//! HTTP Transport Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorCode},
};
use reqwest::Client;
use std::collections::HashMap;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

/// Reqwest-based transport.
///
/// Performs exactly one network exchange per `send`. Retry, timeout policy
/// and cancellation belong to the request pipeline above it.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with default connection settings
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("tour-guide-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a transport around a preconfigured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    /// Map a reqwest failure onto a native transport code.
    fn classify(error: &reqwest::Error) -> TransportErrorCode {
        if error.is_timeout() {
            return TransportErrorCode::Timeout;
        }

        let mut source = error.source();
        while let Some(cause) = source {
            let text = cause.to_string().to_ascii_lowercase();
            if text.contains("dns") || text.contains("failed to lookup address") {
                return TransportErrorCode::Dns;
            }
            source = cause.source();
        }

        if error.is_connect() {
            TransportErrorCode::Connection
        } else {
            TransportErrorCode::Other
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending HTTP request");

        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| TransportError::new(Self::classify(&e), e.to_string()))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(Self::classify(&e), e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestTransport::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestTransport::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/ping")
            .timeout(Duration::from_secs(2));

        let err = transport.send(request).await.unwrap_err();
        assert_ne!(err.code, TransportErrorCode::Aborted);
    }
}
