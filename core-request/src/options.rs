//! Request options and responses

use crate::error::{RequestError, Result};
use bridge_traits::HttpMethod;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// One logical request. Defaults from the pipeline config fill anything
/// left unset.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub data: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serializes `body` as the request payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.data = Some(serde_json::to_value(body).map_err(|e| {
            RequestError::InvalidRequest(format!("body is not serializable: {}", e))
        })?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Successful response. `data` is the parsed JSON body, a JSON string for
/// non-JSON text, or `Null` for an empty body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub data: Value,
}

impl ApiResponse {
    pub fn from_body(status: u16, headers: HashMap<String, String>, body: &[u8]) -> Self {
        let data = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
        };

        Self {
            status,
            headers,
            data,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_parsing() {
        let json_body = ApiResponse::from_body(200, HashMap::new(), br#"{"message":"pong"}"#);
        assert_eq!(json_body.data, json!({"message": "pong"}));

        let text = ApiResponse::from_body(200, HashMap::new(), b"OK");
        assert_eq!(text.data, json!("OK"));

        let empty = ApiResponse::from_body(204, HashMap::new(), b"");
        assert_eq!(empty.data, Value::Null);
    }

    #[test]
    fn test_typed_decode_failure() {
        let response = ApiResponse::from_body(200, HashMap::new(), b"[1,2]");
        let decoded: Result<HashMap<String, u32>> = response.json();
        assert!(matches!(decoded, Err(RequestError::Decode(_))));
    }

    #[test]
    fn test_builder() {
        let options = RequestOptions::get("/spots/nearby")
            .query("latitude", 39.9)
            .header("Accept-Language", "zh-CN")
            .timeout(Duration::from_secs(3));

        assert_eq!(options.method, HttpMethod::Get);
        assert_eq!(options.query, vec![("latitude".to_string(), "39.9".to_string())]);
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
    }
}
