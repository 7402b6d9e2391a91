//! # Playback Module
//!
//! Narrated-audio playback on top of a host [`MediaSession`](bridge_traits::MediaSession).
//!
//! ## Overview
//!
//! This module handles:
//! - The playback state machine and its single state callback
//! - Waiting for a source to become playable, with timeout and load retry
//! - Superseding stale loads when a new source is played
//! - A bounded history of finished sessions
//! - Classifying platform media errors for presentation

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod history;
pub mod state;

pub use config::PlaybackConfig;
pub use controller::{AudioPlaybackController, PlayOptions, PlaybackStatus};
pub use error::{MediaErrorClass, PlaybackError, Result};
pub use events::{PlaybackEvent, StateCallback};
pub use history::{PlaybackHistory, PlaybackHistoryEntry};
pub use state::PlaybackState;
