//! Playback state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the single media session owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Uninitialized,
    Ready,
    Playing,
    Paused,
    Buffering,
    Ended,
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Uninitialized => "uninitialized",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        }
    }

    /// Whether the current session has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Ended | PlaybackState::Error)
    }

    /// Allowed transitions.
    ///
    /// `Buffering` is reachable from every initialized state because a new
    /// load always starts there. `Ready` is reachable the same way through
    /// `stop()`. `destroy()` returns any state to `Uninitialized`.
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::*;

        match (self, next) {
            (from, to) if from == to => false,
            (_, Uninitialized) => true,
            (Uninitialized, to) => to == Ready,
            (_, Ready) | (_, Buffering) => true,
            (Ready | Paused | Buffering, Playing) => true,
            (Playing | Buffering, Paused) => true,
            (Playing, Ended) => true,
            (Ready | Playing | Buffering | Paused, Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
