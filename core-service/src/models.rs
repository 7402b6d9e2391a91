//! Data exchanged with the tour service.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response envelope used by every tour-service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
}

impl<T> Envelope<T> {
    /// Unwraps `data`, turning a failed or empty envelope into an error.
    pub fn into_data(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(CoreError::Service(format!(
                "response carried no data: {}",
                self.message
            ))),
            (false, _) => Err(CoreError::Service(self.message)),
        }
    }
}

/// A device position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the platform reports it.
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Unix milliseconds.
    pub timestamp: i64,
}

/// A narration style offered by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideStyle {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    /// Distance from the queried position in km.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Narration for one spot in one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideContent {
    pub spot_id: u32,
    pub style: String,
    pub title: String,
    pub text: String,
    pub audio_url: String,
}

/// Parameters identifying a piece of guide content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRequest {
    pub spot_id: u32,
    pub style: String,
}

impl ContentRequest {
    pub fn new(spot_id: u32, style: impl Into<String>) -> Self {
        Self {
            spot_id,
            style: style.into(),
        }
    }

    /// Key parameters; every field participates.
    pub fn params(&self) -> Value {
        json!({ "spot_id": self.spot_id, "style": self.style })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_unwrapping() {
        let ok: Envelope<u32> =
            serde_json::from_value(json!({"success": true, "data": 7, "message": "success"}))
                .unwrap();
        assert_eq!(ok.into_data().unwrap(), 7);

        let failed: Envelope<u32> =
            serde_json::from_value(json!({"success": false, "message": "spot not found"}))
                .unwrap();
        assert!(matches!(failed.into_data(), Err(CoreError::Service(m)) if m == "spot not found"));

        let empty: Envelope<u32> =
            serde_json::from_value(json!({"success": true, "data": null})).unwrap();
        assert!(empty.into_data().is_err());
    }

    #[test]
    fn test_spot_tolerates_missing_optionals() {
        let spot: Spot = serde_json::from_value(json!({
            "id": 1,
            "name": "Forbidden City",
            "latitude": 39.9163,
            "longitude": 116.3972,
            "description": "Imperial palace"
        }))
        .unwrap();
        assert_eq!(spot.distance, None);
        assert_eq!(spot.audio_url, None);
    }
}
