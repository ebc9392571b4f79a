use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{Coordinate, WeatherSnapshot},
    units::{Temperature, TemperatureUnit},
};

use super::{WeatherProvider, endpoint, send_json};

const PROVIDER: &str = "openweather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    /// Kelvin; no `units` parameter is sent.
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, ProviderError> {
        let condition = self.weather.into_iter().next().ok_or_else(|| ProviderError::Decode {
            provider: PROVIDER,
            message: "response contained no weather conditions".into(),
        })?;

        Ok(WeatherSnapshot {
            condition_code: condition.id,
            main: condition.main,
            description: condition.description,
            temperature: Temperature::new(self.main.temp, TemperatureUnit::default()),
            city_name: self.name,
            country_code: self.sys.country.unwrap_or_default(),
            observed_at: self.dt.and_then(unix_to_utc),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, ProviderError> {
        let url = endpoint(&self.base_url, "data/2.5/weather");
        tracing::debug!(%coordinate, "requesting current weather");

        let request = self.http.get(&url).query(&[
            ("lat", coordinate.lat.to_string()),
            ("lon", coordinate.lon.to_string()),
            ("appid", self.api_key.clone()),
        ]);

        let parsed: OwCurrentResponse = send_json(PROVIDER, request).await?;
        let snapshot = parsed.into_snapshot()?;

        tracing::info!(
            city = %snapshot.city_name,
            code = snapshot.condition_code,
            kelvin = snapshot.temperature.kelvin(),
            "weather fetched"
        );

        Ok(snapshot)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
