use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::ProviderError, model::Coordinate};

use super::{IpLocator, endpoint, send_json};

const PROVIDER: &str = "ipapi";

/// ipapi.co lookup of the caller's own address. Needs no credentials.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    base_url: String,
    http: Client,
}

impl IpApiLocator {
    pub fn with_base_url(base_url: String, http: Client) -> Self {
        Self { base_url, http }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpApiResponse {
    fn into_coordinate(self) -> Result<Coordinate, ProviderError> {
        if self.error {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: 200,
                body: self.reason.unwrap_or_else(|| "lookup failed".into()),
            });
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)),
            _ => Err(ProviderError::Decode {
                provider: PROVIDER,
                message: "response did not contain latitude/longitude".into(),
            }),
        }
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<Coordinate, ProviderError> {
        let url = endpoint(&self.base_url, "json/");

        let parsed: IpApiResponse = send_json(PROVIDER, self.http.get(&url)).await?;
        let coordinate = parsed.into_coordinate()?;

        tracing::info!(%coordinate, "located by IP address");
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_coordinates() {
        let body = r#"{"ip": "1.2.3.4", "city": "Paris", "latitude": 48.85, "longitude": 2.35}"#;
        let parsed: IpApiResponse = serde_json::from_str(body).expect("valid payload");

        assert_eq!(parsed.into_coordinate().unwrap(), Coordinate::new(48.85, 2.35));
    }

    #[test]
    fn error_flag_becomes_provider_error() {
        let body = r#"{"error": true, "reason": "RateLimited"}"#;
        let parsed: IpApiResponse = serde_json::from_str(body).expect("valid payload");

        let err = parsed.into_coordinate().unwrap_err();
        assert!(err.to_string().contains("RateLimited"));
    }

    #[test]
    fn missing_coordinates_is_a_decode_error() {
        let parsed: IpApiResponse =
            serde_json::from_str(r#"{"ip": "10.0.0.1", "reserved": true}"#).expect("valid payload");

        assert!(matches!(parsed.into_coordinate(), Err(ProviderError::Decode { .. })));
    }
}
