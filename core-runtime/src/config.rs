//! # Core Configuration Module
//!
//! Provides configuration management for the tour guide core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding the settings and host bridges the core is composed from. Values are
//! validated when the config is built so that a misconfigured host fails fast
//! instead of failing on the first request.
//!
//! ## Host Bridges
//!
//! - `HttpTransport` - Network transport (desktop default: reqwest)
//! - `KeyValueStore` - Durable cache tier (desktop default: SQLite)
//! - `MediaBackend` - Platform audio sessions (always injected by the host)
//! - `Clock` - Time source (default: system clock)
//! - `Notifier` - Presentation surface for failures (default: log only)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://tour.example.com/api")
//!     .database_path("/path/to/tour_cache.db")
//!     .media_backend(Arc::new(MyMediaBackend))
//!     .build()?;
//! ```
//!
//! Settings can also be loaded from the environment with
//! [`CoreConfigBuilder::from_env`], after which bridges are injected as usual.

use crate::error::{Error, Result};
use crate::notify::Notifier;
use bridge_traits::{Clock, HttpTransport, KeyValueStore, MediaBackend};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the remote service base URL.
pub const ENV_API_BASE_URL: &str = "TOURGUIDE_API_BASE_URL";
/// Environment variable switching the fixture transport on.
pub const ENV_USE_MOCK: &str = "TOURGUIDE_USE_MOCK";
/// Environment variable holding the durable cache database path.
pub const ENV_DB_PATH: &str = "TOURGUIDE_DB_PATH";

/// Core configuration for the tour guide core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL relative request paths are resolved against
    pub api_base_url: String,

    /// Answer requests from canned fixtures instead of the network
    pub use_mock_transport: bool,

    /// SQLite file backing the durable cache tier when no store is injected
    pub database_path: Option<PathBuf>,

    pub http_transport: Option<Arc<dyn HttpTransport>>,

    pub key_value_store: Option<Arc<dyn KeyValueStore>>,

    pub media_backend: Option<Arc<dyn MediaBackend>>,

    pub clock: Option<Arc<dyn Clock>>,

    pub notifier: Option<Arc<dyn Notifier>>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("use_mock_transport", &self.use_mock_transport)
            .field("database_path", &self.database_path)
            .field(
                "http_transport",
                &self.http_transport.as_ref().map(|t| t.name()),
            )
            .field(
                "key_value_store",
                &self
                    .key_value_store
                    .as_ref()
                    .map(|_| "KeyValueStore { ... }"),
            )
            .field(
                "media_backend",
                &self.media_backend.as_ref().map(|_| "MediaBackend { ... }"),
            )
            .field("clock", &self.clock.as_ref().map(|_| "Clock { ... }"))
            .field("notifier", &self.notifier.as_ref().map(|_| "Notifier { ... }"))
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Back the volatile cache tier with a durable key-value store
    pub enable_durable_cache: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_durable_cache: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Builds a configuration from `TOURGUIDE_*` environment variables only.
    pub fn from_env() -> Result<CoreConfig> {
        CoreConfigBuilder::from_env()?.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - A real transport has an absolute http(s) base URL to resolve against
    /// - A configured database path is not empty
    pub fn validate(&self) -> Result<()> {
        if !self.use_mock_transport {
            if self.api_base_url.trim().is_empty() {
                return Err(Error::Config(
                    "API base URL is required unless the mock transport is enabled. \
                     Use .api_base_url() or set TOURGUIDE_API_BASE_URL."
                        .to_string(),
                ));
            }

            if !(self.api_base_url.starts_with("http://")
                || self.api_base_url.starts_with("https://"))
            {
                return Err(Error::Config(format!(
                    "API base URL must start with http:// or https://, got '{}'",
                    self.api_base_url
                )));
            }
        }

        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        Ok(())
    }

    /// Returns the injected media backend or an actionable error.
    pub fn require_media_backend(&self) -> Result<Arc<dyn MediaBackend>> {
        self.media_backend.clone().ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaBackend".to_string(),
            message: "A MediaBackend implementation is required for audio playback. \
                     Mini-program and mobile hosts: wrap the platform inner audio context. \
                     Desktop: inject a backend built on the host audio stack."
                .to_string(),
        })
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    use_mock_transport: bool,
    database_path: Option<PathBuf>,
    http_transport: Option<Arc<dyn HttpTransport>>,
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    media_backend: Option<Arc<dyn MediaBackend>>,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Arc<dyn Notifier>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Seeds a builder from `TOURGUIDE_*` environment variables.
    ///
    /// Unset variables leave the corresponding field at its default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(url) = lookup(ENV_API_BASE_URL) {
            builder = builder.api_base_url(url);
        }

        if let Some(raw) = lookup(ENV_USE_MOCK) {
            builder = builder.use_mock_transport(parse_flag(ENV_USE_MOCK, &raw)?);
        }

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            builder = builder.database_path(path);
        }

        Ok(builder)
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Route every request through the fixture transport.
    pub fn use_mock_transport(mut self, enabled: bool) -> Self {
        self.use_mock_transport = enabled;
        self
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the network transport.
    ///
    /// If not provided, the reqwest transport is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = Some(transport);
        self
    }

    /// Sets the durable store backing the cache.
    ///
    /// If not provided, a SQLite store at `database_path` is opened when the
    /// `desktop-shims` feature is enabled.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    pub fn media_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.media_backend = Some(backend);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Enables or disables the durable cache tier.
    ///
    /// Default: true
    pub fn enable_durable_cache(mut self, enabled: bool) -> Self {
        self.features.enable_durable_cache = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the collected values fail
    /// [`CoreConfig::validate`].
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            api_base_url: self
                .api_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            use_mock_transport: self.use_mock_transport,
            database_path: self.database_path,
            http_transport: self.http_transport,
            key_value_store: self.key_value_store,
            media_backend: self.media_backend,
            clock: self.clock,
            notifier: self.notifier,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be a boolean (true/false), got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder()
            .api_base_url("https://tour.example.com/api/")
            .build()
            .unwrap();

        assert_eq!(config.api_base_url, "https://tour.example.com/api");
        assert!(!config.use_mock_transport);
        assert!(config.features.enable_durable_cache);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_missing_base_url_is_config_error() {
        let result = CoreConfig::builder().build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("base URL")));
    }

    #[test]
    fn test_mock_transport_needs_no_base_url() {
        let config = CoreConfig::builder()
            .use_mock_transport(true)
            .build()
            .unwrap();
        assert!(config.use_mock_transport);
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let result = CoreConfig::builder().api_base_url("tour.example.com").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let builder = CoreConfigBuilder::from_lookup(lookup_from(&[
            (ENV_API_BASE_URL, "http://localhost:8080"),
            (ENV_USE_MOCK, "yes"),
            (ENV_DB_PATH, "/tmp/tour/cache.db"),
        ]))
        .unwrap();

        let config = builder.enable_durable_cache(false).build().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert!(config.use_mock_transport);
        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/tmp/tour/cache.db"))
        );
        assert!(!config.features.enable_durable_cache);
    }

    #[test]
    fn test_from_lookup_rejects_bad_flag() {
        let result = CoreConfigBuilder::from_lookup(lookup_from(&[(ENV_USE_MOCK, "maybe")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_USE_MOCK)));
    }

    #[test]
    fn test_missing_media_backend_is_actionable() {
        let config = CoreConfig::builder()
            .use_mock_transport(true)
            .build()
            .unwrap();

        match config.require_media_backend() {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "MediaBackend");
                assert!(message.contains("inject"));
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = CoreConfig::builder()
            .use_mock_transport(true)
            .build()
            .unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("use_mock_transport: true"));
        assert!(rendered.contains("media_backend: None"));
    }
}
