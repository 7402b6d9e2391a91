//! Canned-response transport for mock mode.
//!
//! [`FixtureTransport`] answers requests by URL-substring match without
//! touching the network. Built-in routes mirror the tour service:
//!
//! | Route | Response |
//! |-------|----------|
//! | `/ping` | `{"message": "pong"}` |
//! | `/spots/nearby` | spots within `radius` km of `latitude`/`longitude`, nearest first |
//! | `/styles` | the four narration styles |
//! | `/content` | narration text and audio URL for `spot_id` + `style` |
//! | `/guide` | the nearest spot to the posted coordinates |
//!
//! Anything else gets a generic success envelope. Custom fixtures registered
//! with [`FixtureTransport::register`] take precedence over built-in routes.

use async_trait::async_trait;
use bridge_traits::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use core_async::time::sleep;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Largest search radius the service honours, in km.
pub const MAX_SEARCH_DISTANCE_KM: f64 = 50.0;

/// Radius used by `/spots/nearby` when the caller gives none, in km.
pub const NEARBY_DISTANCE_KM: f64 = 1.0;

const AUDIO_BASE_URL: &str = "https://cdn.tourguide.example/audio";

#[derive(Debug, Clone)]
struct FixtureSpot {
    id: u32,
    name: &'static str,
    latitude: f64,
    longitude: f64,
    description: &'static str,
}

impl FixtureSpot {
    fn to_json(&self, distance_km: f64) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "latitude": self.latitude,
            "longitude": self.longitude,
            "description": self.description,
            "distance": round2(distance_km),
            "audio_url": format!("{}/{}.mp3", AUDIO_BASE_URL, self.id),
        })
    }
}

const SPOTS: &[FixtureSpot] = &[
    FixtureSpot {
        id: 1,
        name: "Forbidden City",
        latitude: 39.9163,
        longitude: 116.3972,
        description: "Imperial palace of the Ming and Qing dynasties, home to 24 emperors.",
    },
    FixtureSpot {
        id: 2,
        name: "Tiananmen Square",
        latitude: 39.9055,
        longitude: 116.3976,
        description: "One of the largest public squares in the world, south of the palace gate.",
    },
    FixtureSpot {
        id: 3,
        name: "Temple of Heaven",
        latitude: 39.8822,
        longitude: 116.4066,
        description: "Imperial altar complex where emperors prayed for good harvests.",
    },
    FixtureSpot {
        id: 4,
        name: "Jingshan Park",
        latitude: 39.9250,
        longitude: 116.3967,
        description: "Artificial hill north of the palace with a view over its golden roofs.",
    },
    FixtureSpot {
        id: 5,
        name: "Beihai Park",
        latitude: 39.9254,
        longitude: 116.3893,
        description: "Imperial garden built around a lake, crowned by the White Dagoba.",
    },
];

const STYLES: &[(&str, &str, &str)] = &[
    (
        "history",
        "History & Culture",
        "Highlights historical value and cultural meaning",
    ),
    (
        "anecdote",
        "Anecdotes",
        "Light-hearted stories and legends about the place",
    ),
    (
        "poetry",
        "Poetry & Literature",
        "Literary narration quoting classical poems",
    ),
    (
        "people",
        "People & Stories",
        "Historical figures connected to the place",
    ),
];

/// Great-circle distance between two coordinates, in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_KM
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn envelope(data: Value) -> HttpResponse {
    HttpResponse::json_value(
        200,
        &json!({ "success": true, "data": data, "message": "success" }),
    )
}

fn failure(status: u16, message: &str) -> HttpResponse {
    HttpResponse::json_value(status, &json!({ "success": false, "message": message }))
}

/// Looks `name` up in the query string first, then in a JSON body.
fn param(request: &HttpRequest, name: &str) -> Option<Value> {
    if let Some((_, value)) = request.query.iter().find(|(key, _)| key == name) {
        return Some(Value::String(value.clone()));
    }
    request
        .json_body::<Value>()
        .and_then(|body| body.get(name).cloned())
        .filter(|value| !value.is_null())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

enum Coordinates {
    Missing,
    NotNumeric,
    OutOfRange,
    Valid(f64, f64),
}

fn coordinates(request: &HttpRequest) -> Coordinates {
    let (Some(lat), Some(lon)) = (param(request, "latitude"), param(request, "longitude")) else {
        return Coordinates::Missing;
    };
    let (Some(lat), Some(lon)) = (number(&lat), number(&lon)) else {
        return Coordinates::NotNumeric;
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Coordinates::OutOfRange;
    }
    Coordinates::Valid(lat, lon)
}

fn with_coordinates(request: &HttpRequest, respond: impl FnOnce(f64, f64) -> HttpResponse) -> HttpResponse {
    match coordinates(request) {
        Coordinates::Missing => failure(400, "latitude and longitude are required"),
        Coordinates::NotNumeric => failure(400, "latitude and longitude must be numbers"),
        Coordinates::OutOfRange => failure(400, "coordinates out of range"),
        Coordinates::Valid(lat, lon) => respond(lat, lon),
    }
}

fn by_distance(lat: f64, lon: f64) -> Vec<(f64, &'static FixtureSpot)> {
    let mut spots: Vec<_> = SPOTS
        .iter()
        .map(|spot| (haversine_km(lat, lon, spot.latitude, spot.longitude), spot))
        .collect();
    spots.sort_by(|a, b| a.0.total_cmp(&b.0));
    spots
}

fn guide(request: &HttpRequest) -> HttpResponse {
    with_coordinates(request, |lat, lon| match by_distance(lat, lon).first() {
        Some((distance, spot)) => envelope(spot.to_json(*distance)),
        None => failure(404, "no spot data available"),
    })
}

fn nearby(request: &HttpRequest) -> HttpResponse {
    let radius = param(request, "radius")
        .as_ref()
        .and_then(number)
        .unwrap_or(NEARBY_DISTANCE_KM)
        .clamp(0.0, MAX_SEARCH_DISTANCE_KM);

    with_coordinates(request, |lat, lon| {
        let spots: Vec<Value> = by_distance(lat, lon)
            .into_iter()
            .filter(|(distance, _)| *distance <= radius)
            .map(|(distance, spot)| spot.to_json(distance))
            .collect();
        envelope(Value::Array(spots))
    })
}

fn styles() -> HttpResponse {
    envelope(Value::Array(
        STYLES
            .iter()
            .map(|(key, name, description)| {
                json!({ "key": key, "name": name, "description": description })
            })
            .collect(),
    ))
}

fn content(request: &HttpRequest) -> HttpResponse {
    let spot_id = param(request, "spot_id").as_ref().and_then(number);
    let style_key = param(request, "style")
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| STYLES[0].0.to_string());

    let Some(spot) = spot_id.and_then(|id| SPOTS.iter().find(|spot| f64::from(spot.id) == id))
    else {
        return failure(404, "spot not found");
    };
    let Some((key, name, _)) = STYLES.iter().find(|(key, _, _)| *key == style_key) else {
        return failure(400, "unknown narration style");
    };

    envelope(json!({
        "spot_id": spot.id,
        "style": key,
        "title": format!("{} · {}", spot.name, name),
        "text": format!("{} Told in the {} style.", spot.description, name),
        "audio_url": format!("{}/{}-{}.mp3", AUDIO_BASE_URL, spot.id, key),
    }))
}

/// Offline [`HttpTransport`] serving canned tour-service payloads.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    latency: Duration,
    custom: RwLock<Vec<(String, HttpResponse)>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response by `latency` to simulate a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Serves `response` for any URL containing `pattern`. Later
    /// registrations for the same pattern replace earlier ones.
    pub fn register(&self, pattern: impl Into<String>, response: HttpResponse) {
        let pattern = pattern.into();
        let mut custom = self.custom.write();
        custom.retain(|(existing, _)| *existing != pattern);
        custom.push((pattern, response));
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let url = request.url.as_str();

        if let Some((_, response)) = self
            .custom
            .read()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
        {
            return response.clone();
        }

        if url.contains("/ping") {
            HttpResponse::json_value(200, &json!({ "message": "pong" }))
        } else if url.contains("/spots/nearby") {
            nearby(request)
        } else if url.contains("/styles") {
            styles()
        } else if url.contains("/content") {
            content(request)
        } else if url.contains("/guide") {
            guide(request)
        } else {
            HttpResponse::json_value(
                200,
                &json!({ "success": true, "data": null, "message": "mock response" }),
            )
        }
    }
}

#[async_trait]
impl HttpTransport for FixtureTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        let response = self.respond(&request);
        debug!(url = %request.url, status = response.status, "Served fixture");
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::HttpMethod;

    fn body(response: &HttpResponse) -> Value {
        response.json().unwrap()
    }

    #[test]
    fn test_haversine() {
        assert_eq!(haversine_km(39.9, 116.4, 39.9, 116.4), 0.0);
        // one degree of latitude is about 111.19 km
        assert_eq!(round2(haversine_km(0.0, 0.0, 1.0, 0.0)), 111.19);
    }

    #[test]
    fn test_guide_picks_nearest() {
        let transport = FixtureTransport::new();
        let request = HttpRequest::new(HttpMethod::Post, "/guide")
            .json(&json!({ "latitude": 39.8823, "longitude": 116.4066 }))
            .unwrap();

        let response = transport.respond(&request);
        assert_eq!(response.status, 200);
        let data = &body(&response)["data"];
        assert_eq!(data["name"], "Temple of Heaven");
        assert_eq!(data["distance"], 0.01);
    }

    #[test]
    fn test_guide_validation() {
        let transport = FixtureTransport::new();

        let missing = HttpRequest::new(HttpMethod::Post, "/guide")
            .json(&json!({ "latitude": 39.9 }))
            .unwrap();
        assert_eq!(transport.respond(&missing).status, 400);

        let out_of_range = HttpRequest::new(HttpMethod::Post, "/guide")
            .json(&json!({ "latitude": 91.0, "longitude": 0.0 }))
            .unwrap();
        let response = transport.respond(&out_of_range);
        assert_eq!(response.status, 400);
        assert_eq!(body(&response)["success"], false);

        let numeric_strings = HttpRequest::new(HttpMethod::Post, "/guide")
            .json(&json!({ "latitude": "39.9163", "longitude": "116.3972" }))
            .unwrap();
        assert_eq!(transport.respond(&numeric_strings).status, 200);
    }

    #[test]
    fn test_nearby_sorted_within_radius() {
        let transport = FixtureTransport::new();
        let request = HttpRequest::new(HttpMethod::Get, "/spots/nearby")
            .query("latitude", "39.9163")
            .query("longitude", "116.3972")
            .query("radius", "2");

        let data = body(&transport.respond(&request))["data"].clone();
        let names: Vec<&str> = data
            .as_array()
            .unwrap()
            .iter()
            .map(|spot| spot["name"].as_str().unwrap())
            .collect();

        assert_eq!(names[0], "Forbidden City");
        assert!(names.contains(&"Tiananmen Square"));
        assert!(!names.contains(&"Temple of Heaven"));
    }

    #[test]
    fn test_styles_and_content() {
        let transport = FixtureTransport::new();

        let styles = body(&transport.respond(&HttpRequest::new(HttpMethod::Get, "/styles")));
        assert_eq!(styles["data"].as_array().unwrap().len(), 4);

        let content = HttpRequest::new(HttpMethod::Get, "/content")
            .query("spot_id", "3")
            .query("style", "poetry");
        let data = body(&transport.respond(&content))["data"].clone();
        assert_eq!(data["audio_url"], "https://cdn.tourguide.example/audio/3-poetry.mp3");

        let unknown = HttpRequest::new(HttpMethod::Get, "/content").query("spot_id", "99");
        assert_eq!(transport.respond(&unknown).status, 404);
    }

    #[test]
    fn test_fallback_and_custom_fixtures() {
        let transport = FixtureTransport::new();
        let other = body(&transport.respond(&HttpRequest::new(HttpMethod::Get, "/weather")));
        assert_eq!(other, json!({ "success": true, "data": null, "message": "mock response" }));

        transport.register("/styles", HttpResponse::new(503, "maintenance"));
        let overridden = transport.respond(&HttpRequest::new(HttpMethod::Get, "/styles"));
        assert_eq!(overridden.status, 503);
    }
}
