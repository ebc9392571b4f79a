use std::sync::Arc;

use crate::{
    error::GeocodeError,
    model::{CitySuggestion, Coordinate, ManualLocationInput},
    provider::{Geocoder, PlaceSuggester},
};

pub const MAX_SUGGESTIONS: usize = 5;

/// Place search and single-result geocoding behind one handle.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    suggester: Arc<dyn PlaceSuggester>,
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodingClient {
    pub fn new(suggester: Arc<dyn PlaceSuggester>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            suggester,
            geocoder,
        }
    }

    /// At most [`MAX_SUGGESTIONS`] places starting with `query`.
    ///
    /// Provider failures degrade to an empty list.
    pub async fn suggest(&self, query: &str) -> Vec<CitySuggestion> {
        match self.suggester.search(query, MAX_SUGGESTIONS).await {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                suggestions
            }
            Err(e) => {
                tracing::warn!("Suggestion lookup for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Coordinates of the best match for "City, Country".
    ///
    /// When several places share the name the top-ranked one is used.
    pub async fn resolve(&self, city: &str, country: &str) -> Result<Coordinate, GeocodeError> {
        let query = ManualLocationInput {
            city: city.into(),
            country: country.into(),
        }
        .query();

        let results = self.geocoder.forward(&query).await?;
        if results.len() > 1 {
            tracing::debug!(
                query = %query,
                candidates = results.len(),
                "ambiguous place, using first match"
            );
        }

        let coordinate = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound {
                query: query.clone(),
            })?;

        tracing::info!(query = %query, %coordinate, "resolved manual location");
        Ok(coordinate)
    }
}
