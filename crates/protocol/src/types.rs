//! Value types carried inside protocol messages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Geographic coordinates for geolocation emulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy in meters. The driver defaults this to 0 when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Geolocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }
}

/// Snapshot of an outgoing network request, delivered to route handlers.
///
/// This is an ephemeral value: it describes one request at the moment it was
/// intercepted and is not updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    /// Render-engine resource classification ("document", "image", ...).
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RequestRecord {
    /// Returns the request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the resource type reported by the browser.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

/// Snapshot of a received network response, delivered to response waiters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResponseRecord {
    /// Returns the response URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_record_deserializes_wire_shape() {
        let json = r#"{
            "url": "https://example.com/app.js",
            "method": "GET",
            "resourceType": "script",
            "headers": {"accept": "*/*"}
        }"#;
        let record: RequestRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.url(), "https://example.com/app.js");
        assert_eq!(record.method(), "GET");
        assert_eq!(record.resource_type(), "script");
        assert_eq!(record.headers["accept"], "*/*");
    }

    #[test]
    fn request_record_tolerates_missing_optional_fields() {
        let record: RequestRecord =
            serde_json::from_str(r#"{"url": "https://a.test/", "method": "POST"}"#).unwrap();
        assert_eq!(record.resource_type(), "");
        assert!(record.headers.is_empty());
    }

    #[test]
    fn response_record_reports_status_class() {
        let response: ResponseRecord = serde_json::from_str(
            r#"{"url": "https://example.com/banner.png", "status": 200}"#,
        )
        .unwrap();
        assert!(response.ok());
        assert!(response.headers.is_empty());

        let response: ResponseRecord =
            serde_json::from_str(r#"{"url": "https://example.com/", "status": 404}"#).unwrap();
        assert!(!response.ok());
    }

    #[test]
    fn geolocation_omits_unset_accuracy() {
        let geo = Geolocation::new(41.889938, 12.492507);
        let json = serde_json::to_value(&geo).unwrap();
        assert!(json.get("accuracy").is_none());
        assert_eq!(json["latitude"], 41.889938);
    }
}
