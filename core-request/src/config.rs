//! Request pipeline configuration

use core_runtime::logging::redact_if_sensitive;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

#[derive(Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Relative request URLs are appended to this base
    pub base_url: String,

    /// Per-attempt timeout when the request sets none (default: 10s)
    pub default_timeout: Duration,

    /// Delay before the first retry; doubles on each further retry (default: 1s)
    pub retry_base_delay: Duration,

    /// Retry budget used by `get`/`post` (default: 2)
    pub default_max_retries: u32,

    /// Headers merged under every request's own headers
    pub default_headers: HashMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            base_url: String::new(),
            default_timeout: Duration::from_secs(10),
            retry_base_delay: Duration::from_secs(1),
            default_max_retries: 2,
            default_headers,
        }
    }
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.default_max_retries = retries;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_timeout.is_zero() {
            return Err("default_timeout must be greater than 0".to_string());
        }

        if self.default_max_retries > 10 {
            return Err("default_max_retries must be at most 10".to_string());
        }

        Ok(())
    }

    /// Resolves `url` against `base_url` unless it is already absolute.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") || self.base_url.is_empty() {
            return url.to_string();
        }

        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, String> = self
            .default_headers
            .iter()
            .map(|(key, value)| (key.as_str(), redact_if_sensitive(key, value)))
            .collect();

        f.debug_struct("RequestConfig")
            .field("base_url", &self.base_url)
            .field("default_timeout", &self.default_timeout)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("default_max_retries", &self.default_max_retries)
            .field("default_headers", &headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.default_max_retries, 2);
        assert_eq!(
            config.default_headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_url() {
        let config = RequestConfig::new("https://tour.example.com/api/");
        assert_eq!(config.resolve_url("/styles"), "https://tour.example.com/api/styles");
        assert_eq!(config.resolve_url("styles"), "https://tour.example.com/api/styles");
        assert_eq!(
            config.resolve_url("https://cdn.example.com/a.mp3"),
            "https://cdn.example.com/a.mp3"
        );
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = RequestConfig::new("https://tour.example.com")
            .with_header("Authorization", "Bearer s3cr3t")
            .with_header("X-Contact", "guide@example.com");
        let printed = format!("{:?}", config);

        assert!(printed.contains("application/json"));
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("guide@example.com"));
    }

    #[test]
    fn test_validation() {
        assert!(RequestConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
