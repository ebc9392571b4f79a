use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::ProviderError, model::CitySuggestion};

use super::{PlaceSuggester, endpoint, send_json};

const PROVIDER: &str = "geonames";

/// GeoNames `searchJSON` prefix search.
#[derive(Debug, Clone)]
pub struct GeoNamesSuggester {
    username: String,
    base_url: String,
    http: Client,
}

impl GeoNamesSuggester {
    pub fn with_base_url(username: String, base_url: String, http: Client) -> Self {
        Self {
            username,
            base_url,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GnPlace {
    name: String,
    #[serde(rename = "countryName")]
    country_name: Option<String>,
}

/// GeoNames reports failures (bad username, quota) with HTTP 200 and a `status` object.
#[derive(Debug, Deserialize)]
struct GnStatus {
    message: String,
    value: i64,
}

#[derive(Debug, Deserialize)]
struct GnSearchResponse {
    #[serde(default)]
    geonames: Vec<GnPlace>,
    status: Option<GnStatus>,
}

impl GnSearchResponse {
    fn into_suggestions(self, max_rows: usize) -> Result<Vec<CitySuggestion>, ProviderError> {
        if let Some(status) = self.status {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: 200,
                body: format!("error {}: {}", status.value, status.message),
            });
        }

        Ok(self
            .geonames
            .into_iter()
            .filter_map(|place| {
                let country = place.country_name.filter(|c| !c.is_empty())?;
                Some(CitySuggestion {
                    city: place.name,
                    country,
                })
            })
            .take(max_rows)
            .collect())
    }
}

#[async_trait]
impl PlaceSuggester for GeoNamesSuggester {
    async fn search(
        &self,
        prefix: &str,
        max_rows: usize,
    ) -> Result<Vec<CitySuggestion>, ProviderError> {
        let url = endpoint(&self.base_url, "searchJSON");
        tracing::debug!(prefix, "searching place names");

        let request = self.http.get(&url).query(&[
            ("name_startsWith", prefix.to_string()),
            ("maxRows", max_rows.to_string()),
            ("username", self.username.clone()),
        ]);

        let parsed: GnSearchResponse = send_json(PROVIDER, request).await?;
        parsed.into_suggestions(max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_places_and_skips_entries_without_country() {
        let body = r#"{
            "totalResultsCount": 3,
            "geonames": [
                {"name": "Paris", "countryName": "France", "lat": "48.85", "lng": "2.35"},
                {"name": "Pacific Ocean"},
                {"name": "Paris", "countryName": "United States"}
            ]
        }"#;

        let parsed: GnSearchResponse = serde_json::from_str(body).expect("valid payload");
        let suggestions = parsed.into_suggestions(5).expect("no status error");

        assert_eq!(
            suggestions,
            vec![
                CitySuggestion {
                    city: "Paris".into(),
                    country: "France".into(),
                },
                CitySuggestion {
                    city: "Paris".into(),
                    country: "United States".into(),
                },
            ]
        );
    }

    #[test]
    fn caps_results() {
        let places: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"name": "Town{i}", "countryName": "Nowhere"}}"#))
            .collect();
        let body = format!(r#"{{"geonames": [{}]}}"#, places.join(","));

        let parsed: GnSearchResponse = serde_json::from_str(&body).expect("valid payload");
        assert_eq!(parsed.into_suggestions(5).unwrap().len(), 5);
    }

    #[test]
    fn status_object_is_an_error() {
        let body = r#"{"status": {"message": "user does not exist.", "value": 10}}"#;

        let parsed: GnSearchResponse = serde_json::from_str(body).expect("valid payload");
        let err = parsed.into_suggestions(5).unwrap_err();

        assert!(err.to_string().contains("user does not exist"));
    }
}
