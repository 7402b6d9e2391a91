//! Cache-through access to tour-service data.
//!
//! Each fetch first consults the catalog entry for its data kind and only
//! calls the remote service on a miss. Failed calls are never cached.

use crate::error::Result;
use crate::models::{ContentRequest, Envelope, GuideContent, GuideStyle, Location, Spot};
use core_cache::{round_coordinate, CacheCatalog, CatalogKind};
use core_request::{ApiResponse, RequestPipeline};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const PING_PATH: &str = "/ping";
pub const GUIDE_PATH: &str = "/guide";
pub const STYLES_PATH: &str = "/styles";
pub const NEARBY_PATH: &str = "/spots/nearby";
pub const CONTENT_PATH: &str = "/content";

fn unwrap_envelope<T: DeserializeOwned>(response: ApiResponse) -> Result<T> {
    response.into_json::<Envelope<T>>()?.into_data()
}

async fn fetch_content(
    pipeline: Arc<RequestPipeline>,
    request: ContentRequest,
) -> Result<GuideContent> {
    let query = [
        ("spot_id", request.spot_id.to_string()),
        ("style", request.style),
    ];
    unwrap_envelope(pipeline.get(CONTENT_PATH, &query).await?)
}

#[derive(Debug, Clone)]
pub struct GuideService {
    pipeline: Arc<RequestPipeline>,
    catalog: CacheCatalog,
}

impl GuideService {
    pub fn new(pipeline: Arc<RequestPipeline>, catalog: CacheCatalog) -> Self {
        Self { pipeline, catalog }
    }

    pub fn catalog(&self) -> &CacheCatalog {
        &self.catalog
    }

    /// Health check against the service.
    pub async fn ping(&self) -> Result<bool> {
        let response = self.pipeline.get(PING_PATH, &[]).await?;
        Ok(response.data.get("message").and_then(|m| m.as_str()) == Some("pong"))
    }

    /// Last known device position, or a fresh fix from `locate`.
    ///
    /// Positions come from the host platform, so the caller supplies the
    /// lookup; only the caching is handled here.
    #[instrument(skip(self, locate))]
    pub async fn current_location<F, Fut>(&self, locate: F) -> Result<Location>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Location>>,
    {
        if let Some(location) = self.catalog.get_location::<Location>().await {
            debug!("Using cached location");
            return Ok(location);
        }

        let location = locate().await?;
        self.catalog.set_location(&location).await;
        Ok(location)
    }

    pub async fn remember_location(&self, location: &Location) {
        self.catalog.set_location(location).await;
    }

    #[instrument(skip(self))]
    pub async fn styles(&self) -> Result<Vec<GuideStyle>> {
        if let Some(styles) = self.catalog.get_styles::<Vec<GuideStyle>>().await {
            return Ok(styles);
        }

        let styles: Vec<GuideStyle> = unwrap_envelope(self.pipeline.get(STYLES_PATH, &[]).await?)?;
        self.catalog.set_styles(&styles).await;
        Ok(styles)
    }

    /// Spots around a position, nearest first.
    ///
    /// Positions within about 110 m of each other share one cache entry.
    #[instrument(skip(self))]
    pub async fn nearby_spots(&self, latitude: f64, longitude: f64) -> Result<Vec<Spot>> {
        if let Some(spots) = self.catalog.get_nearby::<Vec<Spot>>(latitude, longitude).await {
            return Ok(spots);
        }

        let query = [
            ("latitude", round_coordinate(latitude).to_string()),
            ("longitude", round_coordinate(longitude).to_string()),
        ];
        let spots: Vec<Spot> = unwrap_envelope(self.pipeline.get(NEARBY_PATH, &query).await?)?;
        self.catalog.set_nearby(latitude, longitude, &spots).await;
        Ok(spots)
    }

    /// The single nearest spot. Always asks the service.
    #[instrument(skip(self))]
    pub async fn nearest_spot(&self, latitude: f64, longitude: f64) -> Result<Spot> {
        let body = json!({ "latitude": latitude, "longitude": longitude });
        unwrap_envelope(self.pipeline.post(GUIDE_PATH, body).await?)
    }

    /// Narration for a spot in one style.
    #[instrument(skip(self))]
    pub async fn content(&self, request: &ContentRequest) -> Result<GuideContent> {
        let pipeline = Arc::clone(&self.pipeline);
        let loader = move |request: ContentRequest| fetch_content(Arc::clone(&pipeline), request);

        self.catalog
            .cached(CatalogKind::GuideContent, ContentRequest::params, loader)
            .call(request.clone())
            .await
    }

    pub async fn invalidate_styles(&self) {
        self.catalog
            .invalidate(CatalogKind::GuideStyles, &json!({}))
            .await;
    }

    pub async fn invalidate_nearby(&self, latitude: f64, longitude: f64) {
        self.catalog
            .invalidate(
                CatalogKind::NearbySpots,
                &core_cache::nearby_params(latitude, longitude),
            )
            .await;
    }
}
