use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{condition::IconCategory, units::Temperature};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Which strategy produced a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Ip,
    Manual,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Device => "device",
            LocationSource::Ip => "ip",
            LocationSource::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub source: LocationSource,
}

/// Current conditions for one fetch. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition_code: i64,
    /// Condition group, e.g. "Clouds".
    pub main: String,
    pub description: String,
    pub temperature: Temperature,
    pub city_name: String,
    pub country_code: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn icon(&self) -> IconCategory {
        IconCategory::classify(self.condition_code)
    }

    /// e.g. "Clouds (broken clouds)". Falls back to the category label when the
    /// provider sent no text.
    pub fn headline(&self) -> String {
        match (self.main.is_empty(), self.description.is_empty()) {
            (false, false) => format!("{} ({})", self.main, self.description),
            (false, true) => self.main.clone(),
            (true, false) => self.description.clone(),
            (true, true) => self.icon().label().to_string(),
        }
    }

    pub fn location_label(&self) -> String {
        if self.country_code.is_empty() {
            self.city_name.clone()
        } else {
            format!("{}, {}", self.city_name, self.country_code)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub city: String,
    pub country: String,
}

impl fmt::Display for CitySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// The user's draft for the manual location form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManualLocationInput {
    pub city: String,
    pub country: String,
}

impl ManualLocationInput {
    pub fn is_complete(&self) -> bool {
        !self.city.trim().is_empty() && !self.country.trim().is_empty()
    }

    /// Geocoding query in "City, Country" form.
    pub fn query(&self) -> String {
        format!("{}, {}", self.city.trim(), self.country.trim())
    }
}

impl From<CitySuggestion> for ManualLocationInput {
    fn from(s: CitySuggestion) -> Self {
        Self { city: s.city, country: s.country }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPhase {
    #[default]
    Resolving,
    Resolved,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;

    fn snapshot(main: &str, description: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            condition_code: 803,
            main: main.into(),
            description: description.into(),
            temperature: Temperature::new(280.0, TemperatureUnit::Celsius),
            city_name: "Oslo".into(),
            country_code: "NO".into(),
            observed_at: None,
        }
    }

    #[test]
    fn headline_combines_main_and_description() {
        assert_eq!(snapshot("Clouds", "broken clouds").headline(), "Clouds (broken clouds)");
        assert_eq!(snapshot("Clouds", "").headline(), "Clouds");
        assert_eq!(snapshot("", "broken clouds").headline(), "broken clouds");
    }

    #[test]
    fn headline_without_text_uses_category() {
        assert_eq!(snapshot("", "").headline(), "Cloudy");
    }

    #[test]
    fn location_label() {
        assert_eq!(snapshot("Clouds", "x").location_label(), "Oslo, NO");
    }

    #[test]
    fn manual_input_requires_both_fields() {
        let mut input = ManualLocationInput {
            city: "Tokyo".into(),
            country: "  ".into(),
        };
        assert!(!input.is_complete());

        input.country = "Japan".into();
        assert!(input.is_complete());
        assert_eq!(input.query(), "Tokyo, Japan");
    }
}
