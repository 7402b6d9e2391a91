//! # Audio Playback Controller
//!
//! Owns the single platform [`MediaSession`] and drives it through the
//! [`PlaybackState`] machine.
//!
//! ## Lifecycle
//!
//! `init()` creates the session and binds one handler per media event kind.
//! `play()` loads a source, waits until it can play, then issues the platform
//! play command, optionally retrying failed loads. `destroy()` releases the
//! session; the controller can be initialized again afterwards.
//!
//! ## Superseding
//!
//! Every `play`, `stop` and `destroy` bumps a load epoch. A pending
//! canplay wait or retry delay that observes a newer epoch gives up with
//! [`PlaybackError::Superseded`] and never touches the session again, so a
//! stale load cannot resume playback of an old source.
//!
//! ## Locking
//!
//! Controller state sits behind a non-reentrant mutex. Platform commands and
//! the state callback always run after the lock is released, because a
//! session may emit events synchronously from inside a command.

use crate::config::{PlaybackConfig, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
use crate::error::{MediaErrorClass, PlaybackError, Result};
use crate::events::{PlaybackEvent, StateCallback};
use crate::history::{PlaybackHistory, PlaybackHistoryEntry};
use crate::state::PlaybackState;
use bridge_traits::{
    Clock, MediaBackend, MediaEvent, MediaEventKind, MediaSession, Subscription, SystemClock,
};
use core_async::sync::{mpsc, watch};
use core_async::time::{sleep, timeout};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

/// Per-call options for [`AudioPlaybackController::play`].
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub title: Option<String>,
    /// Retry failed or timed-out loads after a fixed delay.
    pub auto_retry: bool,
    /// Retry budget; the config default applies when `None`.
    pub max_retries: Option<u32>,
}

impl PlayOptions {
    pub fn new() -> Self {
        Self {
            auto_retry: true,
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn auto_retry(mut self, enabled: bool) -> Self {
        self.auto_retry = enabled;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// Snapshot returned by [`AudioPlaybackController::status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub src: Option<String>,
    pub title: Option<String>,
    pub volume: f32,
    pub playback_rate: f32,
    /// Seconds, from the last time update.
    pub position: f64,
    /// Seconds, `0.0` while unknown.
    pub duration: f64,
}

/// The source currently loaded into the media session.
#[derive(Debug, Clone)]
struct PlaybackSession {
    url: String,
    title: Option<String>,
    started_at: i64,
}

enum Lifecycle {
    Uninitialized,
    Active {
        media: Arc<dyn MediaSession>,
        _handlers: Vec<Subscription>,
    },
    Destroyed,
}

struct Inner {
    lifecycle: Lifecycle,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    history: PlaybackHistory,
    callback: Option<StateCallback>,
    volume: f32,
    playback_rate: f32,
    position: f64,
    duration: f64,
    /// Message of the media error that put the session into `Error`.
    failure: Option<String>,
}

impl Inner {
    fn media(&self) -> Option<Arc<dyn MediaSession>> {
        match &self.lifecycle {
            Lifecycle::Active { media, .. } => Some(Arc::clone(media)),
            _ => None,
        }
    }

    fn media_error(&self) -> Option<PlaybackError> {
        match (&self.failure, self.state) {
            (Some(message), PlaybackState::Error) => Some(PlaybackError::Media {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    fn inactive_reason(&self) -> &'static str {
        match self.lifecycle {
            Lifecycle::Destroyed => "controller destroyed",
            _ => "controller not initialized",
        }
    }

    /// Applies a transition if the state machine allows it.
    fn transition(&mut self, next: PlaybackState) -> bool {
        if self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "Playback state changed");
            self.state = next;
            true
        } else {
            debug!(from = %self.state, to = %next, "Ignoring invalid playback transition");
            false
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    /// Delivers events to the callback outside the lock.
    fn notify(&self, events: Vec<PlaybackEvent>) {
        if events.is_empty() {
            return;
        }
        let (callback, state) = {
            let inner = self.inner.lock();
            (inner.callback.clone(), inner.state)
        };
        if let Some(callback) = callback {
            for event in &events {
                callback(event, state);
            }
        }
    }

    /// Lifecycle handler bound at `init()` for every media event kind.
    fn on_media_event(&self, event: &MediaEvent) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !matches!(inner.lifecycle, Lifecycle::Active { .. }) {
                return;
            }

            match event {
                MediaEvent::Play => {
                    // The platform restarted a finished source: that is a new session.
                    if inner.state.is_terminal() {
                        if let Some(session) = inner.session.as_mut() {
                            session.started_at = self.clock.unix_timestamp_millis();
                            let src = session.url.clone();
                            let title = session.title.clone();
                            inner.position = 0.0;
                            inner.failure = None;
                            inner.transition(PlaybackState::Buffering);
                            events.push(PlaybackEvent::Load { src, title });
                        }
                    }
                    if inner.transition(PlaybackState::Playing) {
                        let src = inner.session.as_ref().map(|s| s.url.clone());
                        events.push(PlaybackEvent::Play { src });
                    }
                }
                MediaEvent::Pause => {
                    if inner.transition(PlaybackState::Paused) {
                        events.push(PlaybackEvent::Pause);
                    }
                }
                MediaEvent::Waiting => {
                    if inner.state == PlaybackState::Playing
                        && inner.transition(PlaybackState::Buffering)
                    {
                        events.push(PlaybackEvent::Waiting);
                    }
                }
                MediaEvent::CanPlay => events.push(PlaybackEvent::CanPlay),
                MediaEvent::Ended => {
                    if inner.transition(PlaybackState::Ended) {
                        let ended_at = self.clock.unix_timestamp_millis();
                        if let Some(session) = inner.session.clone() {
                            let entry = PlaybackHistoryEntry {
                                url: session.url,
                                title: session.title,
                                started_at: session.started_at,
                                ended_at,
                                duration_ms: ended_at - session.started_at,
                            };
                            info!(url = %entry.url, duration_ms = entry.duration_ms, "Playback ended");
                            inner.history.push(entry.clone());
                            events.push(PlaybackEvent::Ended { entry });
                        }
                    }
                }
                MediaEvent::Error { message, code } => {
                    if inner.transition(PlaybackState::Error) {
                        inner.failure = Some(message.clone());
                        let class = MediaErrorClass::classify(message);
                        warn!(message = %message, code = ?code, class = ?class, "Media session error");
                        events.push(PlaybackEvent::Error {
                            message: message.clone(),
                            class,
                        });
                    }
                }
                MediaEvent::TimeUpdate { position, duration } => {
                    inner.position = *position;
                    inner.duration = *duration;
                    events.push(PlaybackEvent::TimeUpdate {
                        position: *position,
                        duration: *duration,
                    });
                }
            }
        }
        self.notify(events);
    }
}

/// State machine around one platform media session.
pub struct AudioPlaybackController {
    config: PlaybackConfig,
    backend: Arc<dyn MediaBackend>,
    shared: Arc<Shared>,
    epoch: watch::Sender<u64>,
}

impl AudioPlaybackController {
    pub fn new(config: PlaybackConfig, backend: Arc<dyn MediaBackend>) -> Self {
        Self::with_clock(config, backend, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: PlaybackConfig,
        backend: Arc<dyn MediaBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let inner = Inner {
            lifecycle: Lifecycle::Uninitialized,
            state: PlaybackState::Uninitialized,
            session: None,
            history: PlaybackHistory::new(config.history_capacity),
            callback: None,
            volume: config.default_volume,
            playback_rate: config.default_playback_rate,
            position: 0.0,
            duration: 0.0,
            failure: None,
        };
        let (epoch, _) = watch::channel(0);

        Self {
            config,
            backend,
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                clock,
            }),
            epoch,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Creates the media session and binds the lifecycle handlers.
    ///
    /// Calling it again while initialized returns the existing session.
    #[instrument(skip(self))]
    pub fn init(&self) -> Result<Arc<dyn MediaSession>> {
        if let Some(media) = self.shared.inner.lock().media() {
            debug!("Playback controller already initialized");
            return Ok(media);
        }

        let media = self.backend.create_session()?;
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handlers = MediaEventKind::ALL
            .iter()
            .map(|kind| {
                let weak = weak.clone();
                media.subscribe(
                    *kind,
                    Arc::new(move |event: &MediaEvent| {
                        if let Some(shared) = weak.upgrade() {
                            shared.on_media_event(event);
                        }
                    }),
                )
            })
            .collect();

        let (volume, rate) = {
            let mut inner = self.shared.inner.lock();
            if let Some(existing) = inner.media() {
                // lost a race with a concurrent init
                return Ok(existing);
            }
            inner.lifecycle = Lifecycle::Active {
                media: Arc::clone(&media),
                _handlers: handlers,
            };
            inner.state = PlaybackState::Uninitialized;
            inner.transition(PlaybackState::Ready);
            (inner.volume, inner.playback_rate)
        };

        media.set_volume(volume);
        media.set_playback_rate(rate);
        info!("Playback controller initialized");
        Ok(media)
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.inner.lock().media().is_some()
    }

    /// Registers the state callback, replacing any previous one.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(&PlaybackEvent, PlaybackState) + Send + Sync + 'static,
    {
        self.shared.inner.lock().callback = Some(Arc::new(callback));
    }

    pub fn clear_callback(&self) {
        self.shared.inner.lock().callback = None;
    }

    /// Plays `url`, loading it first when it is not the current source.
    ///
    /// Load failures and canplay timeouts are retried after
    /// `load_retry_delay` while `options.auto_retry` is set and the budget
    /// lasts. A later `play`, `stop` or `destroy` ends the call with
    /// [`PlaybackError::Superseded`]. Before `init()` or after `destroy()`
    /// this logs a warning and returns `Ok(())`.
    #[instrument(skip(self, options), fields(title = ?options.title))]
    pub async fn play(&self, url: &str, options: PlayOptions) -> Result<()> {
        let mut retries_left = options
            .max_retries
            .unwrap_or(self.config.default_max_retries);
        let mut force_reload = false;

        loop {
            let epoch = match self.play_once(url, &options, force_reload).await {
                Ok(()) => return Ok(()),
                Err((PlaybackError::Superseded, _)) => {
                    debug!(url = %url, "Play superseded");
                    return Err(PlaybackError::Superseded);
                }
                Err((err, epoch)) => {
                    if !(options.auto_retry && retries_left > 0 && err.is_load_failure()) {
                        warn!(url = %url, error = %err, "Playback failed");
                        return Err(err);
                    }
                    epoch
                }
            };

            retries_left -= 1;
            warn!(
                url = %url,
                retries_left,
                delay_ms = self.config.load_retry_delay.as_millis() as u64,
                "Audio load failed, retrying"
            );

            let mut epoch_rx = self.epoch.subscribe();
            let interrupted = core_async::select! {
                _ = sleep(self.config.load_retry_delay) => false,
                _ = epoch_rx.changed() => true,
            };
            if interrupted || !self.is_current(epoch) {
                debug!(url = %url, "Load retry abandoned");
                return Err(PlaybackError::Superseded);
            }
            force_reload = true;
        }
    }

    /// One load-and-play attempt. Failures carry the epoch they belong to.
    async fn play_once(
        &self,
        url: &str,
        options: &PlayOptions,
        force_reload: bool,
    ) -> std::result::Result<(), (PlaybackError, u64)> {
        let mut events = Vec::new();
        let (media, needs_load, epoch) = {
            let mut inner = self.shared.inner.lock();
            let Some(media) = inner.media() else {
                warn!(url = %url, reason = inner.inactive_reason(), "Ignoring play");
                return Ok(());
            };

            let same_source = inner.session.as_ref().map(|s| s.url.as_str()) == Some(url);
            let needs_load = force_reload || !same_source || inner.state.is_terminal();

            if needs_load {
                inner.session = Some(PlaybackSession {
                    url: url.to_string(),
                    title: options.title.clone(),
                    started_at: self.shared.clock.unix_timestamp_millis(),
                });
                inner.position = 0.0;
                inner.duration = 0.0;
                inner.failure = None;
                inner.transition(PlaybackState::Buffering);
                events.push(PlaybackEvent::Load {
                    src: url.to_string(),
                    title: options.title.clone(),
                });
            }

            (media, needs_load, self.bump_epoch())
        };
        self.shared.notify(events);

        if needs_load {
            debug!(url = %url, "Loading source");
            media.set_src(url);
        }

        if let Err(err) = self.wait_until_playable(&media, epoch).await {
            if matches!(err, PlaybackError::LoadTimeout(_)) && self.is_current(epoch) {
                self.fail_load(&err);
            }
            return Err((err, epoch));
        }

        if !self.is_current(epoch) {
            return Err((PlaybackError::Superseded, epoch));
        }

        media.play();
        Ok(())
    }

    /// Waits until the current source can play.
    ///
    /// Resolves at once if the session already has enough data buffered.
    /// A session that failed with a media error reports that error instead
    /// of waiting; `play()` loads a fresh session.
    pub async fn wait_for_canplay(&self) -> Result<()> {
        let media = {
            let inner = self.shared.inner.lock();
            let media = inner.media().ok_or(PlaybackError::NotInitialized)?;
            if let Some(err) = inner.media_error() {
                return Err(err);
            }
            media
        };
        let epoch = *self.epoch.borrow();
        self.wait_until_playable(&media, epoch).await
    }

    /// Settles exactly once on canplay, error, timeout or a newer epoch.
    /// Every listener it attaches is detached before it returns.
    async fn wait_until_playable(
        &self,
        media: &Arc<dyn MediaSession>,
        epoch: u64,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<MediaEvent>();
        let _listeners: Vec<Subscription> = [
            MediaEventKind::CanPlay,
            MediaEventKind::Error,
            MediaEventKind::Waiting,
        ]
        .into_iter()
        .map(|kind| {
            let tx = tx.clone();
            media.subscribe(
                kind,
                Arc::new(move |event: &MediaEvent| {
                    let _ = tx.send(event.clone());
                }),
            )
        })
        .collect();
        drop(tx);

        if media.has_enough_data() {
            return Ok(());
        }

        let mut epoch_rx = self.epoch.subscribe();
        if !self.is_current(epoch) {
            return Err(PlaybackError::Superseded);
        }

        let wait = async {
            loop {
                core_async::select! {
                    event = rx.recv() => match event {
                        Some(MediaEvent::CanPlay) => return Ok(()),
                        Some(MediaEvent::Error { message, .. }) => {
                            return Err(PlaybackError::LoadFailed { message })
                        }
                        Some(_) => debug!("Still buffering"),
                        None => return Err(PlaybackError::Superseded),
                    },
                    changed = epoch_rx.changed() => {
                        if changed.is_err() || !self.is_current(epoch) {
                            return Err(PlaybackError::Superseded);
                        }
                    }
                }
            }
        };

        match timeout(self.config.canplay_timeout, wait).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PlaybackError::LoadTimeout(self.config.canplay_timeout)),
        }
    }

    fn fail_load(&self, err: &PlaybackError) {
        let mut events = Vec::new();
        {
            let mut inner = self.shared.inner.lock();
            if inner.transition(PlaybackState::Error) {
                events.push(PlaybackEvent::Error {
                    message: err.to_string(),
                    class: err.class(),
                });
            }
        }
        self.shared.notify(events);
    }

    fn bump_epoch(&self) -> u64 {
        let mut current = 0;
        self.epoch.send_modify(|epoch| {
            *epoch += 1;
            current = *epoch;
        });
        current
    }

    fn is_current(&self, epoch: u64) -> bool {
        *self.epoch.borrow() == epoch
    }

    /// Runs a direct command against the session, or warns when there is none.
    fn with_media(
        &self,
        command: &str,
        f: impl FnOnce(&mut Inner),
    ) -> Option<Arc<dyn MediaSession>> {
        let mut inner = self.shared.inner.lock();
        match inner.media() {
            Some(media) => {
                f(&mut *inner);
                Some(media)
            }
            None => {
                warn!(command, reason = inner.inactive_reason(), "Ignoring playback command");
                None
            }
        }
    }

    pub fn pause(&self) {
        if let Some(media) = self.with_media("pause", |_| {}) {
            media.pause();
        }
    }

    /// Stops playback and abandons any pending load.
    pub fn stop(&self) {
        let mut stopped = false;
        let Some(media) = self.with_media("stop", |inner| {
            inner.failure = None;
            stopped = inner.transition(PlaybackState::Ready);
        }) else {
            return;
        };

        self.bump_epoch();
        media.stop();
        if stopped {
            self.shared.notify(vec![PlaybackEvent::Stop]);
        }
    }

    /// Pauses while playing, otherwise resumes the current source.
    ///
    /// A source that has ended or failed starts over as a new session once
    /// the platform reports that it is playing.
    pub fn toggle(&self) {
        let mut playing = false;
        let mut has_source = false;
        let Some(media) = self.with_media("toggle", |inner| {
            playing = inner.state == PlaybackState::Playing;
            has_source = inner.session.is_some();
        }) else {
            return;
        };

        if playing {
            media.pause();
        } else if has_source {
            media.play();
        } else {
            debug!("Nothing loaded to toggle");
        }
    }

    /// Sets the volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if let Some(media) = self.with_media("set_volume", |inner| inner.volume = volume) {
            media.set_volume(volume);
        }
    }

    /// Sets the playback rate, clamped to `0.5..=2.0`.
    pub fn set_playback_rate(&self, rate: f32) {
        if rate.is_nan() {
            warn!("Ignoring NaN playback rate");
            return;
        }
        let rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        if let Some(media) = self.with_media("set_playback_rate", |inner| {
            inner.playback_rate = rate
        }) {
            media.set_playback_rate(rate);
        }
    }

    /// Seeks to `position` seconds. Negative positions seek to the start.
    pub fn seek(&self, position: f64) {
        let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        if let Some(media) = self.with_media("seek", |inner| inner.position = position) {
            media.seek(position);
        }
    }

    /// Stops playback and releases the session, callback and history.
    ///
    /// Safe to call repeatedly and before `init()`.
    #[instrument(skip(self))]
    pub fn destroy(&self) {
        let released = {
            let mut inner = self.shared.inner.lock();
            let lifecycle = std::mem::replace(&mut inner.lifecycle, Lifecycle::Destroyed);
            inner.state = PlaybackState::Uninitialized;
            inner.session = None;
            inner.callback = None;
            inner.history.clear();
            inner.position = 0.0;
            inner.duration = 0.0;
            inner.failure = None;
            match lifecycle {
                Lifecycle::Active { media, _handlers } => Some((media, _handlers)),
                Lifecycle::Uninitialized | Lifecycle::Destroyed => None,
            }
        };
        self.bump_epoch();

        match released {
            Some((media, handlers)) => {
                media.stop();
                media.destroy();
                drop(handlers);
                info!("Playback controller destroyed");
            }
            None => debug!("Playback controller already released"),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.inner.lock().state
    }

    pub fn status(&self) -> PlaybackStatus {
        let inner = self.shared.inner.lock();
        PlaybackStatus {
            state: inner.state,
            src: inner.session.as_ref().map(|s| s.url.clone()),
            title: inner.session.as_ref().and_then(|s| s.title.clone()),
            volume: inner.volume,
            playback_rate: inner.playback_rate,
            position: inner.position,
            duration: inner.duration,
        }
    }

    /// Finished sessions, newest last.
    pub fn history(&self) -> Vec<PlaybackHistoryEntry> {
        self.shared.inner.lock().history.entries()
    }

    pub fn clear_history(&self) {
        self.shared.inner.lock().history.clear();
    }

    /// The media error that ended the current session, if it failed.
    pub fn last_error(&self) -> Option<PlaybackError> {
        self.shared.inner.lock().media_error()
    }
}

impl fmt::Debug for AudioPlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("AudioPlaybackController")
            .field("state", &inner.state)
            .field("src", &inner.session.as_ref().map(|s| &s.url))
            .field("history", &inner.history.len())
            .finish_non_exhaustive()
    }
}
