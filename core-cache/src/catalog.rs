//! Named data kinds of the tour guide and how each one is cached.
//!
//! | Kind            | Key parameters                    | Memory | Durable |
//! |-----------------|-----------------------------------|--------|---------|
//! | user location   | none                              | 5 min  | 30 min  |
//! | guide styles    | none                              | 60 min | 24 h    |
//! | nearby spots    | coordinates rounded to 3 decimals | 10 min | 60 min  |
//! | guide content   | full request parameters           | 30 min | 7 days  |

use crate::{
    cached::Cached,
    manager::{CacheManager, SetOptions},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    UserLocation,
    GuideStyles,
    NearbySpots,
    GuideContent,
}

/// Memory and durable TTLs for one data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPair {
    pub memory: Duration,
    pub storage: Duration,
}

impl TtlPair {
    const fn secs(memory: u64, storage: u64) -> Self {
        Self {
            memory: Duration::from_secs(memory),
            storage: Duration::from_secs(storage),
        }
    }

    pub fn set_options(&self) -> SetOptions {
        SetOptions::new()
            .memory_ttl(self.memory)
            .storage_ttl(self.storage)
    }
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::UserLocation,
        CatalogKind::GuideStyles,
        CatalogKind::NearbySpots,
        CatalogKind::GuideContent,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            CatalogKind::UserLocation => "user_location",
            CatalogKind::GuideStyles => "guide_styles",
            CatalogKind::NearbySpots => "nearby_spots",
            CatalogKind::GuideContent => "guide_content",
        }
    }

    pub fn ttl(&self) -> TtlPair {
        match self {
            CatalogKind::UserLocation => TtlPair::secs(5 * MINUTE, 30 * MINUTE),
            CatalogKind::GuideStyles => TtlPair::secs(60 * MINUTE, DAY),
            CatalogKind::NearbySpots => TtlPair::secs(10 * MINUTE, HOUR),
            CatalogKind::GuideContent => TtlPair::secs(30 * MINUTE, 7 * DAY),
        }
    }
}

/// Rounds a coordinate to 3 decimal places (about 110 m), so that nearby
/// queries from almost the same position share a cache entry.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Key parameters for a nearby-spots query.
pub fn nearby_params(latitude: f64, longitude: f64) -> Value {
    json!({
        "latitude": round_coordinate(latitude),
        "longitude": round_coordinate(longitude),
    })
}

/// Typed access to the catalog kinds on top of a shared [`CacheManager`].
#[derive(Debug, Clone)]
pub struct CacheCatalog {
    cache: Arc<CacheManager>,
}

impl CacheCatalog {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn key(&self, kind: CatalogKind, params: &Value) -> String {
        self.cache.generate_key(kind.prefix(), params)
    }

    pub async fn get<T: DeserializeOwned>(&self, kind: CatalogKind, params: &Value) -> Option<T> {
        self.cache.get_as(&self.key(kind, params)).await
    }

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        kind: CatalogKind,
        params: &Value,
        value: &T,
    ) -> bool {
        self.cache
            .set_as(&self.key(kind, params), value, kind.ttl().set_options())
            .await
    }

    pub async fn invalidate(&self, kind: CatalogKind, params: &Value) {
        self.cache.remove(&self.key(kind, params)).await;
    }

    pub async fn get_location<T: DeserializeOwned>(&self) -> Option<T> {
        self.get(CatalogKind::UserLocation, &json!({})).await
    }

    pub async fn set_location<T: Serialize>(&self, location: &T) -> bool {
        self.set(CatalogKind::UserLocation, &json!({}), location).await
    }

    pub async fn get_styles<T: DeserializeOwned>(&self) -> Option<T> {
        self.get(CatalogKind::GuideStyles, &json!({})).await
    }

    pub async fn set_styles<T: Serialize + ?Sized>(&self, styles: &T) -> bool {
        self.set(CatalogKind::GuideStyles, &json!({}), styles).await
    }

    pub async fn get_nearby<T: DeserializeOwned>(&self, latitude: f64, longitude: f64) -> Option<T> {
        self.get(CatalogKind::NearbySpots, &nearby_params(latitude, longitude))
            .await
    }

    pub async fn set_nearby<T: Serialize + ?Sized>(
        &self,
        latitude: f64,
        longitude: f64,
        spots: &T,
    ) -> bool {
        self.set(
            CatalogKind::NearbySpots,
            &nearby_params(latitude, longitude),
            spots,
        )
        .await
    }

    pub async fn get_content<T: DeserializeOwned>(&self, params: &Value) -> Option<T> {
        self.get(CatalogKind::GuideContent, params).await
    }

    pub async fn set_content<T: Serialize + ?Sized>(&self, params: &Value, content: &T) -> bool {
        self.set(CatalogKind::GuideContent, params, content).await
    }

    /// Cache-through wrapper for `loader` using the key scheme and TTLs of `kind`.
    ///
    /// `params_of` maps the loader's argument to the key parameters.
    pub fn cached<A, P, F>(
        &self,
        kind: CatalogKind,
        params_of: P,
        loader: F,
    ) -> Cached<impl Fn(&A) -> String, F>
    where
        P: Fn(&A) -> Value,
    {
        let cache = Arc::clone(&self.cache);
        let key_fn = move |arg: &A| cache.generate_key(kind.prefix(), &params_of(arg));
        Cached::new(Arc::clone(&self.cache), key_fn, loader)
            .with_options(kind.ttl().set_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_pairs() {
        let minutes = |kind: CatalogKind| {
            let ttl = kind.ttl();
            (ttl.memory.as_secs() / 60, ttl.storage.as_secs() / 60)
        };

        assert_eq!(minutes(CatalogKind::UserLocation), (5, 30));
        assert_eq!(minutes(CatalogKind::GuideStyles), (60, 24 * 60));
        assert_eq!(minutes(CatalogKind::NearbySpots), (10, 60));
        assert_eq!(minutes(CatalogKind::GuideContent), (30, 7 * 24 * 60));
    }

    #[test]
    fn test_nearby_keys_share_rounded_position() {
        let catalog = CacheCatalog::new(Arc::new(CacheManager::in_memory(Default::default())));

        let a = catalog.key(CatalogKind::NearbySpots, &nearby_params(39.90421, 116.40739));
        let b = catalog.key(CatalogKind::NearbySpots, &nearby_params(39.90449, 116.40701));
        let c = catalog.key(CatalogKind::NearbySpots, &nearby_params(39.9056, 116.4074));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("nearby_spots_"));
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes: std::collections::HashSet<_> =
            CatalogKind::ALL.iter().map(|k| k.prefix()).collect();
        assert_eq!(prefixes.len(), CatalogKind::ALL.len());
    }
}
