//! # Playback Error Types

use bridge_traits::BridgeError;
use core_runtime::{ErrorKind, UserFacingError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Coarse cause of a media failure, derived from the platform's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaErrorClass {
    Timeout,
    Network,
    Format,
    Unknown,
}

impl MediaErrorClass {
    /// Classifies a platform error message by case-insensitive substring.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

        if has(&["timeout", "timed out"]) {
            MediaErrorClass::Timeout
        } else if has(&["network", "connection"]) {
            MediaErrorClass::Network
        } else if has(&["format", "decode", "unsupported"]) {
            MediaErrorClass::Format
        } else {
            MediaErrorClass::Unknown
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            MediaErrorClass::Timeout => "The audio took too long to load. Please try again.",
            MediaErrorClass::Network => "The audio could not be downloaded. Check your connection.",
            MediaErrorClass::Format => "This audio format is not supported on your device.",
            MediaErrorClass::Unknown => "Playback failed. Please try again.",
        }
    }
}

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// A command that needs a media session ran before `init()`.
    #[error("Playback controller not initialized")]
    NotInitialized,

    /// The session reported an error while loading the source.
    #[error("Failed to load audio: {message}")]
    LoadFailed { message: String },

    /// The source did not become playable in time.
    #[error("Audio did not become playable within {0:?}")]
    LoadTimeout(Duration),

    /// A newer `play`, `stop` or `destroy` replaced this load.
    #[error("Playback request superseded")]
    Superseded,

    /// The session failed after playback started.
    #[error("Media error: {message}")]
    Media { message: String },

    /// The platform could not create a media session.
    #[error("Media backend error: {0}")]
    Backend(#[from] BridgeError),
}

impl PlaybackError {
    pub fn class(&self) -> MediaErrorClass {
        match self {
            PlaybackError::LoadTimeout(_) => MediaErrorClass::Timeout,
            PlaybackError::LoadFailed { message } | PlaybackError::Media { message } => {
                MediaErrorClass::classify(message)
            }
            _ => MediaErrorClass::Unknown,
        }
    }

    /// Load failures eligible for the automatic retry in `play`.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed { .. } | PlaybackError::LoadTimeout(_)
        )
    }
}

impl UserFacingError for PlaybackError {
    fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::NotInitialized | PlaybackError::Backend(_) => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Media,
        }
    }

    fn user_message(&self) -> String {
        match self {
            PlaybackError::NotInitialized | PlaybackError::Backend(_) => {
                "Audio playback is unavailable on this device.".to_string()
            }
            PlaybackError::Superseded => "Playback was interrupted.".to_string(),
            _ => self.class().user_message().to_string(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            PlaybackError::LoadFailed { .. }
            | PlaybackError::LoadTimeout(_)
            | PlaybackError::Media { .. } => self.class() != MediaErrorClass::Format,
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
