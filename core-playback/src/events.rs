//! Notifications delivered to the registered state callback.

use crate::error::MediaErrorClass;
use crate::history::PlaybackHistoryEntry;
use crate::state::PlaybackState;
use serde::Serialize;
use std::sync::Arc;

/// Event name plus payload, serialized as `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
pub enum PlaybackEvent {
    /// A new source started loading.
    Load { src: String, title: Option<String> },
    Play { src: Option<String> },
    Pause,
    Stop,
    Waiting,
    CanPlay,
    Ended { entry: PlaybackHistoryEntry },
    Error { message: String, class: MediaErrorClass },
    TimeUpdate { position: f64, duration: f64 },
}

impl PlaybackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackEvent::Load { .. } => "load",
            PlaybackEvent::Play { .. } => "play",
            PlaybackEvent::Pause => "pause",
            PlaybackEvent::Stop => "stop",
            PlaybackEvent::Waiting => "waiting",
            PlaybackEvent::CanPlay => "canplay",
            PlaybackEvent::Ended { .. } => "ended",
            PlaybackEvent::Error { .. } => "error",
            PlaybackEvent::TimeUpdate { .. } => "timeupdate",
        }
    }
}

/// Externally registered observer. Receives every event together with the
/// state the controller is in after handling it.
pub type StateCallback = Arc<dyn Fn(&PlaybackEvent, PlaybackState) + Send + Sync>;
