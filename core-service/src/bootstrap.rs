//! Composition root.
//!
//! [`TourGuideCore`] resolves the host bridges named in a [`CoreConfig`] and
//! builds exactly one cache, one request pipeline and one playback controller
//! from them. Hosts keep the core for the lifetime of the app and share the
//! components through the accessors.

use crate::error::{CoreError, Result};
use crate::guide::GuideService;
use bridge_traits::{Clock, HttpTransport, KeyValueStore, SystemClock};
use core_cache::{CacheCatalog, CacheConfig, CacheManager};
use core_playback::{AudioPlaybackController, PlaybackConfig};
use core_request::{FixtureTransport, RequestConfig, RequestPipeline};
use core_runtime::config::CoreConfig;
use core_runtime::logging::strip_path;
use core_runtime::{ErrorPresenter, LogNotifier, Notice, UserFacingError};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tuning for the components the core builds.
#[derive(Debug, Clone, Default)]
pub struct ComponentConfigs {
    pub cache: CacheConfig,
    /// `base_url` is overwritten with the core's API base URL.
    pub request: RequestConfig,
    pub playback: PlaybackConfig,
}

pub struct TourGuideCore {
    config: CoreConfig,
    cache: Arc<CacheManager>,
    pipeline: Arc<RequestPipeline>,
    player: Arc<AudioPlaybackController>,
    guide: GuideService,
    presenter: ErrorPresenter,
}

impl TourGuideCore {
    /// Build the core with default component tuning.
    pub async fn new(config: CoreConfig) -> Result<Self> {
        Self::with_components(config, ComponentConfigs::default()).await
    }

    #[instrument(skip_all, fields(mock = config.use_mock_transport))]
    pub async fn with_components(config: CoreConfig, components: ComponentConfigs) -> Result<Self> {
        config.validate()?;

        let ComponentConfigs {
            cache: cache_config,
            request: request_config,
            playback: playback_config,
        } = components;

        let clock: Arc<dyn Clock> = config
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock));
        let transport = resolve_transport(&config)?;
        let store = resolve_store(&config).await;
        let media = config.require_media_backend()?;

        cache_config
            .validate()
            .map_err(|err| CoreError::InitializationFailed(format!("cache: {err}")))?;
        let request_config =
            request_config.with_base_url(config.api_base_url.trim_end_matches('/'));
        request_config
            .validate()
            .map_err(|err| CoreError::InitializationFailed(format!("request: {err}")))?;
        playback_config
            .validate()
            .map_err(|err| CoreError::InitializationFailed(format!("playback: {err}")))?;

        let durable = store.is_some();
        let cache = Arc::new(CacheManager::new(cache_config, store, Arc::clone(&clock)));
        let pipeline = Arc::new(RequestPipeline::new(request_config, transport));
        let player = Arc::new(AudioPlaybackController::with_clock(
            playback_config,
            media,
            clock,
        ));
        let guide = GuideService::new(
            Arc::clone(&pipeline),
            CacheCatalog::new(Arc::clone(&cache)),
        );
        let presenter = ErrorPresenter::new(
            config
                .notifier
                .clone()
                .unwrap_or_else(|| Arc::new(LogNotifier)),
        );

        info!(
            transport = pipeline_transport_name(&config),
            durable_cache = durable,
            "Tour guide core ready"
        );

        Ok(Self {
            config,
            cache,
            pipeline,
            player,
            guide,
            presenter,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn player(&self) -> &Arc<AudioPlaybackController> {
        &self.player
    }

    pub fn guide(&self) -> &GuideService {
        &self.guide
    }

    /// Route a failure to the host notifier.
    pub fn present<E>(&self, err: &E, allow_retry: bool) -> Notice
    where
        E: UserFacingError + ?Sized,
    {
        self.presenter.present(err, allow_retry)
    }

    /// Abort in-flight requests and release the audio session.
    ///
    /// Cached data is kept. Safe to call more than once.
    pub fn shutdown(&self) {
        let cancelled = self.pipeline.cancel_all_requests();
        self.player.destroy();
        info!(cancelled, "Tour guide core shut down");
    }
}

impl std::fmt::Debug for TourGuideCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourGuideCore")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

fn pipeline_transport_name(config: &CoreConfig) -> &'static str {
    if config.use_mock_transport {
        "fixture"
    } else if config.http_transport.is_some() {
        "injected"
    } else {
        "default"
    }
}

fn resolve_transport(config: &CoreConfig) -> Result<Arc<dyn HttpTransport>> {
    if config.use_mock_transport {
        debug!("Answering requests from fixtures");
        return Ok(Arc::new(FixtureTransport::new()));
    }

    if let Some(transport) = &config.http_transport {
        return Ok(Arc::clone(transport));
    }

    default_transport()
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
fn default_transport() -> Result<Arc<dyn HttpTransport>> {
    let transport = bridge_desktop::ReqwestTransport::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    Ok(Arc::new(transport))
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
fn default_transport() -> Result<Arc<dyn HttpTransport>> {
    Err(core_runtime::Error::CapabilityMissing {
        capability: "HttpTransport".to_string(),
        message: "No HttpTransport was injected and the desktop shims are disabled. \
                  Provide one with CoreConfigBuilder::http_transport or enable mock mode."
            .to_string(),
    }
    .into())
}

/// Injected store first, then SQLite at `database_path` when the desktop
/// shims are available. A store that fails to open leaves the cache
/// volatile-only.
async fn resolve_store(config: &CoreConfig) -> Option<Arc<dyn KeyValueStore>> {
    if !config.features.enable_durable_cache {
        debug!("Durable cache tier disabled");
        return None;
    }

    if let Some(store) = &config.key_value_store {
        return Some(Arc::clone(store));
    }

    let path = config.database_path.clone()?;
    open_default_store(path).await
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
async fn open_default_store(path: std::path::PathBuf) -> Option<Arc<dyn KeyValueStore>> {
    let db = store_file_name(&path);
    match bridge_desktop::SqliteKeyValueStore::new(path).await {
        Ok(store) => {
            debug!(db = %db, "Durable cache opened");
            Some(Arc::new(store))
        }
        Err(err) => {
            warn!(db = %db, error = %err, "Durable cache unavailable, continuing in memory");
            None
        }
    }
}

#[cfg(not(all(feature = "desktop-shims", not(target_arch = "wasm32"))))]
async fn open_default_store(path: std::path::PathBuf) -> Option<Arc<dyn KeyValueStore>> {
    warn!(
        db = %store_file_name(&path),
        "No durable store available without the desktop shims"
    );
    None
}

/// File name of the store, without the directories that may reveal the user.
fn store_file_name(path: &std::path::Path) -> String {
    strip_path(&path.to_string_lossy()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_resolution_respects_feature_flag() {
        let store: Arc<dyn KeyValueStore> = Arc::new(bridge_desktop::MemoryKeyValueStore::new());
        let enabled = CoreConfig::builder()
            .use_mock_transport(true)
            .key_value_store(Arc::clone(&store))
            .build()
            .unwrap();
        assert!(resolve_store(&enabled).await.is_some());

        let mut disabled = enabled.clone();
        disabled.features.enable_durable_cache = false;
        assert!(resolve_store(&disabled).await.is_none());

        let mut no_path = enabled;
        no_path.key_value_store = None;
        assert!(resolve_store(&no_path).await.is_none());
    }

    #[test]
    fn test_store_file_name_drops_directories() {
        let path = std::path::Path::new("/home/ana/.local/share/tour/cache.db");
        assert_eq!(store_file_name(path), "cache.db");
        assert_eq!(store_file_name(std::path::Path::new("cache.db")), "cache.db");
    }

    #[test]
    fn test_mock_mode_ignores_injected_transport() {
        let config = CoreConfig::builder()
            .use_mock_transport(true)
            .build()
            .unwrap();
        assert_eq!(resolve_transport(&config).unwrap().name(), "fixture");
        assert_eq!(pipeline_transport_name(&config), "fixture");
    }
}
