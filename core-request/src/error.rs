use bridge_traits::{TransportError, TransportErrorCode};
use core_runtime::{ErrorKind, UserFacingError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Native failure code of a request that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorCode {
    Timeout,
    Aborted,
    Connection,
    Dns,
    Other,
}

impl NetworkErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorCode::Timeout => "timeout",
            NetworkErrorCode::Aborted => "aborted",
            NetworkErrorCode::Connection => "connection",
            NetworkErrorCode::Dns => "dns",
            NetworkErrorCode::Other => "other",
        }
    }
}

impl fmt::Display for NetworkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TransportErrorCode> for NetworkErrorCode {
    fn from(code: TransportErrorCode) -> Self {
        match code {
            TransportErrorCode::Timeout => NetworkErrorCode::Timeout,
            TransportErrorCode::Aborted => NetworkErrorCode::Aborted,
            TransportErrorCode::Connection => NetworkErrorCode::Connection,
            TransportErrorCode::Dns => NetworkErrorCode::Dns,
            TransportErrorCode::Other => NetworkErrorCode::Other,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The server answered outside [200, 300).
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The exchange failed before a status was received.
    #[error("Network error ({code}): {message}")]
    Network {
        code: NetworkErrorCode,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RequestError {
    pub fn network(code: NetworkErrorCode, message: impl Into<String>) -> Self {
        RequestError::Network {
            code,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self::network(NetworkErrorCode::Aborted, "request aborted")
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn network_code(&self) -> Option<NetworkErrorCode> {
        match self {
            RequestError::Network { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.network_code() == Some(NetworkErrorCode::Aborted)
    }

    /// Transient failures: network/timeout class (except abort) and HTTP 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Http { status, .. } => (500..600).contains(status),
            RequestError::Network { code, .. } => *code != NetworkErrorCode::Aborted,
            RequestError::InvalidRequest(_) | RequestError::Decode(_) => false,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        RequestError::Network {
            code: err.code.into(),
            message: err.message,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Decode(err.to_string())
    }
}

impl UserFacingError for RequestError {
    fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Http { status, .. } if (400..500).contains(status) => {
                ErrorKind::ClientRequest
            }
            RequestError::Http { .. } | RequestError::Network { .. } => {
                ErrorKind::TransientNetwork
            }
            RequestError::InvalidRequest(_) => ErrorKind::Configuration,
            RequestError::Decode(_) => ErrorKind::ClientRequest,
        }
    }

    fn user_message(&self) -> String {
        match self {
            RequestError::Network {
                code: NetworkErrorCode::Timeout,
                ..
            } => "The request timed out. Please try again.".to_string(),
            RequestError::Network {
                code: NetworkErrorCode::Aborted,
                ..
            } => "The request was cancelled.".to_string(),
            RequestError::Network { .. } => {
                "Network unavailable. Check your connection and try again.".to_string()
            }
            RequestError::Http { status, .. } if *status >= 500 => {
                "The tour service is having trouble. Please try again later.".to_string()
            }
            RequestError::Http { status: 404, .. } => "Nothing was found here.".to_string(),
            RequestError::Http { .. } => "The request could not be completed.".to_string(),
            RequestError::InvalidRequest(_) => "The app is not configured correctly".to_string(),
            RequestError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        RequestError::is_retryable(self)
    }
}

pub type Result<T> = std::result::Result<T, RequestError>;
