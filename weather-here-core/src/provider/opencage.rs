use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::ProviderError, model::Coordinate};

use super::{Geocoder, endpoint, send_json};

const PROVIDER: &str = "opencage";

#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenCageGeocoder {
    pub fn with_base_url(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OcGeometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OcResult {
    geometry: OcGeometry,
}

#[derive(Debug, Deserialize)]
struct OcResponse {
    #[serde(default)]
    results: Vec<OcResult>,
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn forward(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError> {
        let url = endpoint(&self.base_url, "geocode/v1/json");
        tracing::debug!(query, "forward geocoding");

        let request = self.http.get(&url).query(&[
            ("q", query),
            ("key", self.api_key.as_str()),
            ("limit", "1"),
            ("no_annotations", "1"),
        ]);

        let parsed: OcResponse = send_json(PROVIDER, request).await?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| Coordinate::new(r.geometry.lat, r.geometry.lng))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_in_order() {
        let body = r#"{
            "results": [
                {"geometry": {"lat": 35.68, "lng": 139.69}, "formatted": "Tokyo, Japan"},
                {"geometry": {"lat": 35.0, "lng": 139.0}}
            ],
            "status": {"code": 200, "message": "OK"},
            "total_results": 2
        }"#;

        let parsed: OcResponse = serde_json::from_str(body).expect("valid payload");

        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].geometry.lat, 35.68);
        assert_eq!(parsed.results[0].geometry.lng, 139.69);
    }

    #[test]
    fn missing_results_is_empty() {
        let parsed: OcResponse =
            serde_json::from_str(r#"{"status": {"code": 200, "message": "OK"}}"#).expect("valid");
        assert!(parsed.results.is_empty());
    }
}
