//! Retry policy

use crate::error::RequestError;
use core_async::time::backoff_delay;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type RetryPredicate = Arc<dyn Fn(&RequestError) -> bool + Send + Sync>;

/// How many times to re-attempt a request, how long to wait, and which
/// failures qualify.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
    pub retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Exponential backoff retrying network-class failures and HTTP 5xx.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            retryable: Arc::new(RequestError::is_retryable),
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    /// Delay before retry number `retry` (1-based): `base_delay * 2^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        backoff_delay(self.base_delay, retry)
    }

    pub fn should_retry(&self, error: &RequestError, retries_done: u32) -> bool {
        retries_done < self.max_retries && (self.retryable)(error)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}
