//! Media session bridge traits.
//!
//! A [`MediaSession`] wraps the platform's single audio element (mini-program
//! inner audio context, `HTMLAudioElement`, AVPlayer, ExoPlayer). Commands are
//! fire-and-forget; outcomes arrive later as [`MediaEvent`]s delivered to the
//! listeners registered through [`MediaSession::subscribe`].
//!
//! Every subscription returns a [`Subscription`] handle. Dropping the handle
//! (or calling [`Subscription::unsubscribe`]) detaches exactly the listener it
//! registered, which is how callers guarantee they never leak listeners.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lifecycle event categories a session can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEventKind {
    Play,
    Pause,
    Ended,
    Error,
    CanPlay,
    Waiting,
    TimeUpdate,
}

impl MediaEventKind {
    pub const ALL: [MediaEventKind; 7] = [
        MediaEventKind::Play,
        MediaEventKind::Pause,
        MediaEventKind::Ended,
        MediaEventKind::Error,
        MediaEventKind::CanPlay,
        MediaEventKind::Waiting,
        MediaEventKind::TimeUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaEventKind::Play => "play",
            MediaEventKind::Pause => "pause",
            MediaEventKind::Ended => "ended",
            MediaEventKind::Error => "error",
            MediaEventKind::CanPlay => "canplay",
            MediaEventKind::Waiting => "waiting",
            MediaEventKind::TimeUpdate => "timeupdate",
        }
    }
}

impl fmt::Display for MediaEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted by a media session.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    Ended,
    Error {
        message: String,
        code: Option<i32>,
    },
    CanPlay,
    Waiting,
    TimeUpdate {
        /// Current position in seconds.
        position: f64,
        /// Total duration in seconds, `0.0` while unknown.
        duration: f64,
    },
}

impl MediaEvent {
    pub fn error(message: impl Into<String>) -> Self {
        MediaEvent::Error {
            message: message.into(),
            code: None,
        }
    }

    pub fn kind(&self) -> MediaEventKind {
        match self {
            MediaEvent::Play => MediaEventKind::Play,
            MediaEvent::Pause => MediaEventKind::Pause,
            MediaEvent::Ended => MediaEventKind::Ended,
            MediaEvent::Error { .. } => MediaEventKind::Error,
            MediaEvent::CanPlay => MediaEventKind::CanPlay,
            MediaEvent::Waiting => MediaEventKind::Waiting,
            MediaEvent::TimeUpdate { .. } => MediaEventKind::TimeUpdate,
        }
    }
}

/// Listener callback invoked with each matching event.
pub type MediaListener = Arc<dyn Fn(&MediaEvent) + Send + Sync>;

/// Handle for one registered listener.
///
/// The listener stays attached until the handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle that detaches nothing.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detach the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Platform media session (one loaded source at a time).
///
/// Implementations must deliver events for one session in emission order and
/// must not hold internal locks while invoking listeners.
pub trait MediaSession: Send + Sync {
    /// Replace the loaded source. Loading starts asynchronously.
    fn set_src(&self, url: &str);

    /// Currently loaded source, if any.
    fn src(&self) -> Option<String>;

    /// Volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Playback speed multiplier.
    fn set_playback_rate(&self, rate: f32);

    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    /// Seek to an absolute position in seconds.
    fn seek(&self, position: f64);

    /// Release platform resources. The session is unusable afterwards.
    fn destroy(&self);

    /// Whether enough data is buffered to start playback without waiting.
    fn has_enough_data(&self) -> bool;

    /// Register a listener for one event kind.
    fn subscribe(&self, kind: MediaEventKind, listener: MediaListener) -> Subscription;
}

/// Factory for platform media sessions.
pub trait MediaBackend: Send + Sync {
    fn create_session(&self) -> Result<Arc<dyn MediaSession>>;
}

/// Listener bookkeeping shared by [`MediaSession`] implementations.
///
/// `emit` snapshots the matching listeners before invoking them, so a listener
/// may subscribe or unsubscribe from inside its own callback.
#[derive(Clone, Default)]
pub struct MediaEventEmitter {
    inner: Arc<Mutex<EmitterInner>>,
}

#[derive(Default)]
struct EmitterInner {
    next_id: u64,
    listeners: Vec<(u64, MediaEventKind, MediaListener)>,
}

impl MediaEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: MediaEventKind, listener: MediaListener) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, kind, listener));
            id
        };

        let weak: Weak<Mutex<EmitterInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(entry, _, _)| *entry != id);
            }
        })
    }

    pub fn emit(&self, event: &MediaEvent) {
        let kind = event.kind();
        let targets: Vec<MediaListener> = self
            .inner
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        for listener in targets {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn listener_count_for(&self, kind: MediaEventKind) -> usize {
        self.inner
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Drop every listener, e.g. when the session is destroyed.
    pub fn clear(&self) {
        self.inner.lock().listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> MediaListener {
        let counter = Arc::clone(counter);
        Arc::new(move |_event: &MediaEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn emit_reaches_only_matching_kind() {
        let emitter = MediaEventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _play = emitter.subscribe(MediaEventKind::Play, counting_listener(&hits));
        let _pause = emitter.subscribe(MediaEventKind::Pause, counting_listener(&hits));

        emitter.emit(&MediaEvent::Play);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_detaches_listener() {
        let emitter = MediaEventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let sub = emitter.subscribe(MediaEventKind::CanPlay, counting_listener(&hits));
        assert_eq!(emitter.listener_count(), 1);
        drop(sub);
        assert_eq!(emitter.listener_count(), 0);

        emitter.emit(&MediaEvent::CanPlay);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_detaches_only_its_own_listener() {
        let emitter = MediaEventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let first = emitter.subscribe(MediaEventKind::Ended, counting_listener(&hits));
        let _second = emitter.subscribe(MediaEventKind::Ended, counting_listener(&hits));
        first.unsubscribe();

        emitter.emit(&MediaEvent::Ended);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count_for(MediaEventKind::Ended), 1);
    }

    #[test]
    fn subscription_outliving_emitter_is_harmless() {
        let emitter = MediaEventEmitter::new();
        let sub = emitter.subscribe(MediaEventKind::Play, Arc::new(|_: &MediaEvent| {}));
        drop(emitter);
        drop(sub);
    }

    #[test]
    fn event_kind_names_match_platform_names() {
        assert_eq!(MediaEvent::CanPlay.kind().as_str(), "canplay");
        assert_eq!(
            MediaEvent::TimeUpdate {
                position: 1.0,
                duration: 2.0
            }
            .kind()
            .as_str(),
            "timeupdate"
        );
        assert_eq!(MediaEvent::error("boom").kind(), MediaEventKind::Error);
    }
}
