//! End-to-end behaviour of the composed core over fixture data.

use async_trait::async_trait;
use bridge_desktop::MemoryKeyValueStore;
use bridge_traits::{
    BridgeError, Clock, HttpRequest, HttpResponse, HttpTransport, ManualClock,
    MediaBackend, MediaEvent, MediaEventEmitter, MediaEventKind, MediaListener, MediaSession,
    Subscription, TransportError,
};
use core_playback::{PlayOptions, PlaybackState};
use core_request::{FixtureTransport, RequestError};
use core_runtime::config::CoreConfig;
use core_runtime::{ErrorKind, Notice, Notifier, UserFacingError};
use core_service::{ContentRequest, CoreError, Location, TourGuideCore};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FORBIDDEN_CITY: (f64, f64) = (39.9163, 116.3972);

/// Fixture transport that counts every exchange reaching it.
#[derive(Default)]
struct CountingTransport {
    fixtures: FixtureTransport,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl CountingTransport {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for CountingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(request.url.clone());
        self.fixtures.send(request).await
    }
}

/// Session that becomes playable as soon as a source is set.
#[derive(Default)]
struct InstantSession {
    emitter: MediaEventEmitter,
    src: Mutex<Option<String>>,
    destroyed: AtomicUsize,
}

impl MediaSession for InstantSession {
    fn set_src(&self, url: &str) {
        *self.src.lock() = Some(url.to_string());
        self.emitter.emit(&MediaEvent::CanPlay);
    }

    fn src(&self) -> Option<String> {
        self.src.lock().clone()
    }

    fn set_volume(&self, _volume: f32) {}

    fn set_playback_rate(&self, _rate: f32) {}

    fn play(&self) {
        self.emitter.emit(&MediaEvent::Play);
    }

    fn pause(&self) {
        self.emitter.emit(&MediaEvent::Pause);
    }

    fn stop(&self) {}

    fn seek(&self, _position: f64) {}

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        self.emitter.clear();
    }

    fn has_enough_data(&self) -> bool {
        self.src.lock().is_some()
    }

    fn subscribe(&self, kind: MediaEventKind, listener: MediaListener) -> Subscription {
        self.emitter.subscribe(kind, listener)
    }
}

#[derive(Default)]
struct InstantBackend {
    session: Arc<InstantSession>,
}

impl MediaBackend for InstantBackend {
    fn create_session(&self) -> Result<Arc<dyn MediaSession>, BridgeError> {
        let session: Arc<dyn MediaSession> = self.session.clone();
        Ok(session)
    }
}

mock! {
    pub Notifier {}

    impl Notifier for Notifier {
        fn notify(&self, notice: Notice);
    }
}

struct Setup {
    transport: Arc<CountingTransport>,
    backend: Arc<InstantBackend>,
    clock: Arc<ManualClock>,
    store: Option<Arc<MemoryKeyValueStore>>,
}

impl Setup {
    fn new() -> Self {
        Self {
            transport: Arc::new(CountingTransport::default()),
            backend: Arc::new(InstantBackend::default()),
            clock: Arc::new(ManualClock::at_millis(1_700_000_000_000)),
            store: None,
        }
    }

    fn with_store(mut self, store: Arc<MemoryKeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn config(&self) -> CoreConfig {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let mut builder = CoreConfig::builder()
            .api_base_url("https://tour.example/api/")
            .http_transport(self.transport.clone())
            .media_backend(self.backend.clone())
            .clock(clock);
        builder = match &self.store {
            Some(store) => builder.key_value_store(store.clone()),
            None => builder.enable_durable_cache(false),
        };
        builder.build().unwrap()
    }

    async fn core(&self) -> TourGuideCore {
        TourGuideCore::new(self.config()).await.unwrap()
    }
}

#[tokio::test]
async fn test_nearby_spots_are_cached_per_rounded_position() {
    let setup = Setup::new();
    let core = setup.core().await;

    let spots = core
        .guide()
        .nearby_spots(FORBIDDEN_CITY.0, FORBIDDEN_CITY.1)
        .await
        .unwrap();
    assert_eq!(spots[0].name, "Forbidden City");
    assert!(spots.iter().all(|spot| spot.distance.unwrap() <= 1.0));
    assert_eq!(setup.transport.calls(), 1);

    // Within the same 3-decimal cell.
    let again = core.guide().nearby_spots(39.91634, 116.39718).await.unwrap();
    assert_eq!(again, spots);
    assert_eq!(setup.transport.calls(), 1);

    core.guide().nearby_spots(39.9055, 116.3976).await.unwrap();
    assert_eq!(setup.transport.calls(), 2);

    let urls = setup.transport.urls.lock().clone();
    assert!(urls[0].starts_with("https://tour.example/api/spots/nearby"));
}

#[tokio::test]
async fn test_nearby_memory_expiry_without_durable_tier() {
    let setup = Setup::new();
    let core = setup.core().await;

    core.guide()
        .nearby_spots(FORBIDDEN_CITY.0, FORBIDDEN_CITY.1)
        .await
        .unwrap();
    setup.clock.advance(Duration::from_secs(9 * 60));
    core.guide()
        .nearby_spots(FORBIDDEN_CITY.0, FORBIDDEN_CITY.1)
        .await
        .unwrap();
    assert_eq!(setup.transport.calls(), 1);

    setup.clock.advance(Duration::from_secs(2 * 60));
    core.guide()
        .nearby_spots(FORBIDDEN_CITY.0, FORBIDDEN_CITY.1)
        .await
        .unwrap();
    assert_eq!(setup.transport.calls(), 2);
}

#[tokio::test]
async fn test_durable_tier_outlives_memory_and_restarts() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let setup = Setup::new().with_store(store.clone());
    let core = setup.core().await;

    let styles = core.guide().styles().await.unwrap();
    assert_eq!(styles.len(), 4);
    assert!(!store.is_empty());

    // Past the one-hour memory TTL, inside the one-day durable TTL.
    setup.clock.advance(Duration::from_secs(2 * 60 * 60));
    assert_eq!(core.guide().styles().await.unwrap(), styles);
    assert_eq!(setup.transport.calls(), 1);

    // A fresh core over the same store starts warm.
    let restarted = setup.core().await;
    assert_eq!(restarted.guide().styles().await.unwrap(), styles);
    assert_eq!(setup.transport.calls(), 1);

    setup.clock.advance(Duration::from_secs(24 * 60 * 60));
    let cold = setup.core().await;
    cold.guide().styles().await.unwrap();
    assert_eq!(setup.transport.calls(), 2);
}

#[tokio::test]
async fn test_content_is_cached_and_failures_are_not() {
    let setup = Setup::new();
    let core = setup.core().await;

    let request = ContentRequest::new(3, "poetry");
    let content = core.guide().content(&request).await.unwrap();
    assert_eq!(content.spot_id, 3);
    assert_eq!(content.style, "poetry");
    assert_eq!(
        content.audio_url,
        "https://cdn.tourguide.example/audio/3-poetry.mp3"
    );

    core.guide().content(&request).await.unwrap();
    assert_eq!(setup.transport.calls(), 1);

    core.guide()
        .content(&ContentRequest::new(3, "history"))
        .await
        .unwrap();
    assert_eq!(setup.transport.calls(), 2);

    let missing = ContentRequest::new(99, "history");
    let err = core.guide().content(&missing).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Request(RequestError::Http { status: 404, .. })
    ));
    assert_eq!(err.kind(), ErrorKind::ClientRequest);

    core.guide().content(&missing).await.unwrap_err();
    assert_eq!(setup.transport.calls(), 4);
}

#[tokio::test]
async fn test_nearest_spot_always_asks_service() {
    let setup = Setup::new();
    let core = setup.core().await;

    let spot = core.guide().nearest_spot(39.8825, 116.4060).await.unwrap();
    assert_eq!(spot.name, "Temple of Heaven");
    core.guide().nearest_spot(39.8825, 116.4060).await.unwrap();
    assert_eq!(setup.transport.calls(), 2);
}

#[tokio::test]
async fn test_failed_envelope_becomes_service_error() {
    let setup = Setup::new();
    setup.transport.fixtures.register(
        "/styles",
        HttpResponse::json_value(
            200,
            &serde_json::json!({"success": false, "message": "styles unavailable"}),
        ),
    );
    let core = setup.core().await;

    let err = core.guide().styles().await.unwrap_err();
    assert!(matches!(&err, CoreError::Service(m) if m == "styles unavailable"));
    assert_eq!(err.user_message(), "styles unavailable");
}

#[tokio::test]
async fn test_location_lookup_runs_once_within_ttl() {
    let setup = Setup::new();
    let core = setup.core().await;
    let counter = AtomicUsize::new(0);
    let lookups = &counter;

    let locate = move || async move {
        lookups.fetch_add(1, Ordering::SeqCst);
        Ok::<_, CoreError>(Location {
            latitude: FORBIDDEN_CITY.0,
            longitude: FORBIDDEN_CITY.1,
            accuracy: Some(12.0),
            timestamp: 1_700_000_000_000,
        })
    };

    let first = core.guide().current_location(locate).await.unwrap();
    let second = core.guide().current_location(locate).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);

    setup.clock.advance(Duration::from_secs(6 * 60));
    core.guide().current_location(locate).await.unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_ping_in_mock_mode() {
    let backend: Arc<dyn MediaBackend> = Arc::new(InstantBackend::default());
    let config = CoreConfig::builder()
        .use_mock_transport(true)
        .enable_durable_cache(false)
        .media_backend(backend)
        .build()
        .unwrap();
    let core = TourGuideCore::new(config).await.unwrap();

    assert!(core.guide().ping().await.unwrap());
    assert!(!core.cache().has_durable_tier());
}

#[tokio::test]
async fn test_missing_media_backend_fails_fast() {
    let config = CoreConfig::builder()
        .use_mock_transport(true)
        .build()
        .unwrap();

    let err = TourGuideCore::new(config).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Config(core_runtime::Error::CapabilityMissing { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_present_routes_notice_to_host() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|notice| notice.retry_available && notice.title == "Network problem")
        .times(1)
        .return_const(());

    let setup = Setup::new();
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let mut config = setup.config();
    config.notifier = Some(notifier);
    let core = TourGuideCore::new(config).await.unwrap();

    let err = CoreError::from(RequestError::Http {
        status: 503,
        body: "busy".to_string(),
    });
    let notice = core.present(&err, true);
    assert!(notice.dismissible);
}

#[tokio::test]
async fn test_guide_content_plays_and_shutdown_releases_session() {
    let setup = Setup::new();
    let core = setup.core().await;

    let content = core
        .guide()
        .content(&ContentRequest::new(1, "history"))
        .await
        .unwrap();

    core.player().init().unwrap();
    core.player()
        .play(&content.audio_url, PlayOptions::new().title(content.title.clone()))
        .await
        .unwrap();
    assert_eq!(core.player().state(), PlaybackState::Playing);
    assert_eq!(
        setup.backend.session.src().as_deref(),
        Some(content.audio_url.as_str())
    );

    core.shutdown();
    core.shutdown();
    assert!(!core.player().is_initialized());
    assert_eq!(core.player().state(), PlaybackState::Uninitialized);
    assert_eq!(setup.backend.session.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(core.pipeline().pending_request_count(), 0);
}
