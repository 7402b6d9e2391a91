//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - JSON, pretty-print and compact output formats
//! - Module-level filtering through `EnvFilter`
//! - Helpers for keeping secrets and user paths out of log lines
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug);
//!
//! init_logging(config)?;
//! tracing::info!("Tour guide core started");
//! ```

use crate::error::{Error, Result};
use bridge_traits::time::LogLevel;
use std::io;
use tracing_subscriber::{
    filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Crates whose events follow the configured level. Everything else is
/// held at `warn` unless a custom filter is supplied.
const WORKSPACE_TARGETS: &[&str] = &[
    "tourguide_workspace",
    "core_runtime",
    "core_cache",
    "core_request",
    "core_playback",
    "core_service",
    "bridge_desktop",
];

const NOISY_DEPENDENCIES: &[&str] = &["h2", "hyper", "reqwest", "sqlx"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Minimum level for workspace crates
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_request=debug,core_cache=trace")
    pub filter: Option<String>,
    /// Emit span enter/exit events
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup.
///
/// # Errors
///
/// Returns [`Error::Config`] if a global subscriber is already installed or
/// the filter string does not parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info)
                    .with_span_events(span_events(&config))
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(config.enable_spans)
                    .with_span_list(config.enable_spans)
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info)
                    .with_writer(io::stdout),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info)
                    .with_writer(io::stdout),
            )
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn span_events(config: &LoggingConfig) -> FmtSpan {
    if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, level))
                .chain(NOISY_DEPENDENCIES.iter().map(|dep| format!("{}=warn", dep)))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Helper function to redact sensitive field values
///
/// ```ignore
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(api_key = %redact_if_sensitive("api_key", key), "Configured transport");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else if let Some(at_pos) = value.find('@').filter(|_| value.contains('.')) {
        // Likely an email - keep the first character only
        let first: String = value[..at_pos].chars().take(1).collect();
        format!("{first}***@[REDACTED]")
    } else {
        value.to_string()
    }
}

/// Strip full file paths to basename only
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap().to_string();

        assert!(filter.contains("core_cache=debug"));
        assert!(filter.contains("core_playback=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_custom_filter_replaces_default() {
        let config = LoggingConfig::default().with_filter("core_request=trace");
        let filter = build_filter(&config).unwrap().to_string();

        assert!(filter.contains("core_request=trace"));
        assert!(!filter.contains("core_cache"));
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_request=[");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(redact_if_sensitive("api_key", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");

        let redacted = redact_if_sensitive("email", "guide@example.com");
        assert!(redacted.starts_with('g'));
        assert!(!redacted.contains("example.com"));

        assert_eq!(redact_if_sensitive("spot_id", "spot_001"), "spot_001");

        let redacted = redact_if_sensitive("email", "张三@example.com");
        assert_eq!(redacted, "张***@[REDACTED]");
        assert_eq!(redact_if_sensitive("email", "@example.com"), "***@[REDACTED]");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/guide/data/tour.db"), "tour.db");
        assert_eq!(strip_path("C:\\Users\\guide\\tour.db"), "tour.db");
        assert_eq!(strip_path("tour.db"), "tour.db");
    }
}
