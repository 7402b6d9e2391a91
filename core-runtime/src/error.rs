use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes every component maps its errors onto.
///
/// The class decides how a failure travels: whether it is retried
/// automatically, swallowed at the component boundary, or surfaced to the
/// user straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid setup. Fatal, never retried.
    Configuration,
    /// Timeout, connection loss or a 5xx answer. Retried per policy.
    TransientNetwork,
    /// A 4xx answer. Surfaced immediately.
    ClientRequest,
    /// Durable-tier failure. Logged and swallowed by the cache.
    Storage,
    /// Playback failure. Retried up to the caller budget, then surfaced.
    Media,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientNetwork | ErrorKind::Media)
    }

    /// Short headline used for notifications.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "Configuration problem",
            ErrorKind::TransientNetwork => "Network problem",
            ErrorKind::ClientRequest => "Request failed",
            ErrorKind::Storage => "Storage problem",
            ErrorKind::Media => "Playback problem",
        }
    }
}

/// Errors that can be shown to the user through the presentation hook.
pub trait UserFacingError: std::error::Error {
    fn kind(&self) -> ErrorKind;

    /// Message suitable for a notification, free of internal detail.
    fn user_message(&self) -> String;

    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl UserFacingError for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }

    fn user_message(&self) -> String {
        match self {
            Error::CapabilityMissing { capability, .. } => {
                format!("This device does not provide {}", capability)
            }
            _ => "The app is not configured correctly".to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }
}
