//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridges (HTTP transport, durable key-value
//! store, media backend, clock, notifier) into the shared tour guide core.
//! Desktop hosts typically enable the `desktop-shims` feature, which falls
//! back to the reqwest transport and a SQLite store from `bridge-desktop`
//! when nothing is injected. Other hosts inject every bridge themselves.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_playback::PlayOptions;
//! use core_service::{ContentRequest, TourGuideCore};
//!
//! let core = TourGuideCore::new(
//!     CoreConfig::builder()
//!         .use_mock_transport(true)
//!         .media_backend(backend)
//!         .build()?,
//! )
//! .await?;
//!
//! let spots = core.guide().nearby_spots(39.9163, 116.3972).await?;
//! let content = core.guide().content(&ContentRequest::new(spots[0].id, "history")).await?;
//! core.player().init()?;
//! core.player().play(&content.audio_url, PlayOptions::new()).await?;
//! ```

pub mod bootstrap;
pub mod error;
pub mod guide;
pub mod models;

pub use bootstrap::{ComponentConfigs, TourGuideCore};
pub use error::{CoreError, Result};
pub use guide::GuideService;
pub use models::{ContentRequest, Envelope, GuideContent, GuideStyle, Location, Spot};
