use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::ProviderError,
    model::{CitySuggestion, Coordinate, WeatherSnapshot},
};

pub mod geonames;
pub mod ipapi;
pub mod opencage;
pub mod openweather;

pub use geonames::GeoNamesSuggester;
pub use ipapi::IpApiLocator;
pub use opencage::OpenCageGeocoder;
pub use openweather::OpenWeatherProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("weather-here/", env!("CARGO_PKG_VERSION"));

/// Current conditions keyed by coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, ProviderError>;
}

/// Coarse location from the caller's public IP address.
#[async_trait]
pub trait IpLocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinate, ProviderError>;
}

/// Place names starting with a prefix.
#[async_trait]
pub trait PlaceSuggester: Send + Sync + Debug {
    async fn search(
        &self,
        prefix: &str,
        max_rows: usize,
    ) -> Result<Vec<CitySuggestion>, ProviderError>;
}

/// Forward geocoding of a free-form place name. Results are ordered best match first.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn forward(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError>;
}

/// HTTP client shared by every provider.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

/// Send a request and decode a JSON body, mapping every failure onto [`ProviderError`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let res = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::Unauthorized {
            provider,
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
        provider,
        message: e.to_string(),
    })
}

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "service unavailable";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(250);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("https://api.openweathermap.org/", "/data/2.5/weather"),
            "https://api.openweathermap.org/data/2.5/weather"
        );
        assert_eq!(endpoint("http://127.0.0.1:4000", "json/"), "http://127.0.0.1:4000/json/");
    }
}
