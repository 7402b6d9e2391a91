use core_playback::PlaybackError;
use core_request::RequestError;
use core_runtime::{ErrorKind, UserFacingError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// The service answered with `success: false` or without data.
    #[error("Service error: {0}")]
    Service(String),
}

impl UserFacingError for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InitializationFailed(_) => ErrorKind::Configuration,
            CoreError::Config(err) => err.kind(),
            CoreError::Request(err) => err.kind(),
            CoreError::Playback(err) => err.kind(),
            CoreError::Service(_) => ErrorKind::ClientRequest,
        }
    }

    fn user_message(&self) -> String {
        match self {
            CoreError::InitializationFailed(_) => {
                "The tour guide could not start. Please restart the app.".to_string()
            }
            CoreError::Config(err) => err.user_message(),
            CoreError::Request(err) => err.user_message(),
            CoreError::Playback(err) => err.user_message(),
            CoreError::Service(message) => message.clone(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Request(err) => UserFacingError::is_retryable(err),
            CoreError::Playback(err) => UserFacingError::is_retryable(err),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
