//! Request execution: timeout, cancellation, classification and retry.

use crate::config::RequestConfig;
use crate::error::{NetworkErrorCode, RequestError, Result};
use crate::options::{ApiResponse, RequestOptions};
use crate::registry::RequestRegistry;
use crate::retry::RetryPolicy;
use bridge_traits::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use bytes::Bytes;
use core_async::time::{sleep, timeout};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Executes requests against a host transport.
///
/// Each attempt is registered while in flight, bounded by a timeout, and
/// classified into an [`ApiResponse`] or a [`RequestError`]. Retry wrappers
/// re-issue transient failures with exponential backoff.
pub struct RequestPipeline {
    config: RequestConfig,
    transport: Arc<dyn HttpTransport>,
    registry: Arc<RequestRegistry>,
}

impl RequestPipeline {
    pub fn new(config: RequestConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            registry: Arc::new(RequestRegistry::new()),
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    /// Performs a single attempt.
    ///
    /// The call stays in the pending registry until it settles. Cancelling it
    /// through [`cancel`](Self::cancel) or
    /// [`cancel_all_requests`](Self::cancel_all_requests) drops the transport
    /// future and yields a `Network` error with code `Aborted`.
    #[instrument(skip(self, options), fields(method = %options.method, url = %options.url))]
    pub async fn request(&self, options: RequestOptions) -> Result<ApiResponse> {
        let request = self.build_request(&options)?;
        let deadline = options.timeout.unwrap_or(self.config.default_timeout);

        let guard = self.registry.register(&request.url);
        let token = guard.token().clone();
        debug!(id = guard.id(), timeout_ms = deadline.as_millis() as u64, "Sending request");

        let outcome = core_async::select! {
            _ = token.cancelled() => Err(RequestError::aborted()),
            sent = timeout(deadline, self.transport.send(request)) => match sent {
                Ok(Ok(response)) => Self::classify(response),
                Ok(Err(transport_error)) => Err(transport_error.into()),
                Err(_) => Err(RequestError::network(
                    NetworkErrorCode::Timeout,
                    format!("no response within {}ms", deadline.as_millis()),
                )),
            },
        };
        drop(guard);

        match &outcome {
            Ok(response) => debug!(status = response.status, "Request completed"),
            Err(err) => debug!(error = %err, "Request failed"),
        }
        outcome
    }

    /// Performs the request, retrying transient failures up to `max_retries`
    /// times with the configured base delay.
    pub async fn request_with_retry(
        &self,
        options: RequestOptions,
        max_retries: u32,
    ) -> Result<ApiResponse> {
        let policy = RetryPolicy::new(max_retries, self.config.retry_base_delay);
        self.request_with_policy(options, &policy).await
    }

    /// Performs the request under an explicit retry policy.
    ///
    /// Non-retryable failures, including cancellation, end the loop
    /// immediately. Retries never exceed `policy.max_retries`. A
    /// [`cancel_all_requests`](Self::cancel_all_requests) issued while the
    /// loop waits between attempts ends it with an `Aborted` error.
    pub async fn request_with_policy(
        &self,
        options: RequestOptions,
        policy: &RetryPolicy,
    ) -> Result<ApiResponse> {
        let mut retries = 0u32;
        let generation = self.registry.generation();

        loop {
            match self.request(options.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) if policy.should_retry(&err, retries) => {
                    retries += 1;
                    let delay = policy.delay_for(retries);
                    warn!(
                        url = %options.url,
                        attempt = retries,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    core_async::select! {
                        _ = generation.cancelled() => {
                            debug!(url = %options.url, "Request aborted during backoff");
                            return Err(RequestError::aborted());
                        }
                        _ = sleep(delay) => {}
                    }
                }
                Err(err) => {
                    if err.is_aborted() {
                        debug!(url = %options.url, "Request aborted");
                    } else {
                        error!(
                            url = %options.url,
                            attempts = retries + 1,
                            error = %err,
                            "Request failed"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    /// GET with the default retry budget.
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<ApiResponse> {
        let options = query
            .iter()
            .fold(RequestOptions::get(url), |options, (key, value)| {
                options.query(*key, value)
            });
        self.request_with_retry(options, self.config.default_max_retries)
            .await
    }

    /// POST a JSON body with the default retry budget.
    pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse> {
        self.request_with_retry(
            RequestOptions::post(url).data(body),
            self.config.default_max_retries,
        )
        .await
    }

    /// Aborts one in-flight call by registry id.
    pub fn cancel(&self, id: u64) -> bool {
        self.registry.cancel(id)
    }

    /// Aborts every in-flight call and every retry loop waiting out a
    /// backoff. Returns how many in-flight calls were cancelled.
    pub fn cancel_all_requests(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn pending_request_count(&self) -> usize {
        self.registry.len()
    }

    fn build_request(&self, options: &RequestOptions) -> Result<HttpRequest> {
        if options.url.trim().is_empty() {
            return Err(RequestError::InvalidRequest("url is empty".to_string()));
        }

        let mut request = HttpRequest::new(options.method, self.config.resolve_url(&options.url));
        request.headers = self.config.default_headers.clone();
        request.headers.extend(options.headers.clone());
        request.query = options.query.clone();

        if let Some(data) = &options.data {
            if matches!(options.method, HttpMethod::Get | HttpMethod::Head) {
                return Err(RequestError::InvalidRequest(format!(
                    "{} requests cannot carry a body",
                    options.method
                )));
            }
            let body = serde_json::to_vec(data)
                .map_err(|e| RequestError::InvalidRequest(e.to_string()))?;
            request.body = Some(Bytes::from(body));
        }

        Ok(request)
    }

    fn classify(response: HttpResponse) -> Result<ApiResponse> {
        if response.is_success() {
            Ok(ApiResponse::from_body(
                response.status,
                response.headers,
                &response.body,
            ))
        } else {
            Err(RequestError::Http {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
    }
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .field("pending", &self.registry.len())
            .finish()
    }
}
