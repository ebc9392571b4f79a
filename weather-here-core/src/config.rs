use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, fs, path::Path, path::PathBuf, time::Duration};

use crate::{error::ConfigError, units::TemperatureUnit};

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_GEOCODING_URL: &str = "https://api.opencagedata.com";
pub const DEFAULT_SUGGESTION_URL: &str = "https://secure.geonames.org";
pub const DEFAULT_IP_LOCATION_URL: &str = "https://ipapi.co";

/// One of the three credentials the application needs at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    OpenWeather,
    OpenCage,
    GeoNames,
}

impl CredentialKind {
    /// Key name in the `[credentials]` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::OpenWeather => "openweather_api_key",
            CredentialKind::OpenCage => "opencage_api_key",
            CredentialKind::GeoNames => "geonames_username",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKind::OpenWeather => "OPENWEATHERMAP_API_KEY",
            CredentialKind::OpenCage => "OPENCAGE_API_KEY",
            CredentialKind::GeoNames => "GEONAMES_USERNAME",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            CredentialKind::OpenWeather => "openweather",
            CredentialKind::OpenCage => "opencage",
            CredentialKind::GeoNames => "geonames",
        }
    }

    pub const fn all() -> &'static [CredentialKind] {
        &[CredentialKind::OpenWeather, CredentialKind::OpenCage, CredentialKind::GeoNames]
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl TryFrom<&str> for CredentialKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        CredentialKind::all()
            .iter()
            .copied()
            .find(|k| k.short_name() == lower || k.as_str() == lower)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown credential '{value}'. Supported: openweather, opencage, geonames."
                )
            })
    }
}

/// Raw credential values as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    pub openweather_api_key: Option<String>,
    pub opencage_api_key: Option<String>,
    pub geonames_username: Option<String>,
}

impl CredentialsConfig {
    fn slot(&self, kind: CredentialKind) -> &Option<String> {
        match kind {
            CredentialKind::OpenWeather => &self.openweather_api_key,
            CredentialKind::OpenCage => &self.opencage_api_key,
            CredentialKind::GeoNames => &self.geonames_username,
        }
    }

    fn slot_mut(&mut self, kind: CredentialKind) -> &mut Option<String> {
        match kind {
            CredentialKind::OpenWeather => &mut self.openweather_api_key,
            CredentialKind::OpenCage => &mut self.opencage_api_key,
            CredentialKind::GeoNames => &mut self.geonames_username,
        }
    }
}

/// Validated credentials. Only obtainable through [`Config::credentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub weather_api_key: String,
    pub geocoding_api_key: String,
    pub suggestion_username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub weather: String,
    pub geocoding: String,
    pub suggestion: String,
    pub ip_location: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: DEFAULT_WEATHER_URL.into(),
            geocoding: DEFAULT_GEOCODING_URL.into(),
            suggestion: DEFAULT_SUGGESTION_URL.into(),
            ip_location: DEFAULT_IP_LOCATION_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub high_accuracy: bool,
    pub device_timeout_ms: u64,
    /// Fixed position reported as the "device" location, for hosts without a
    /// location service.
    pub device_latitude: Option<f64>,
    pub device_longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            device_timeout_ms: 5_000,
            device_latitude: None,
            device_longitude: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutocompleteConfig {
    pub debounce_ms: u64,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub unit: TemperatureUnit,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [credentials]
/// openweather_api_key = "..."
/// opencage_api_key = "..."
/// geonames_username = "..."
///
/// [autocomplete]
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub endpoints: Endpoints,
    pub location: LocationConfig,
    pub autocomplete: AutocompleteConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from the platform config directory, or an empty default if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-here", "weather-here")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override credentials with values found through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in CredentialKind::all() {
            if let Some(value) = lookup(kind.env_var()).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(credential = kind.as_str(), "credential taken from environment");
                *self.credentials.slot_mut(*kind) = Some(value);
            }
        }
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    pub fn set_credential(&mut self, kind: CredentialKind, value: String) {
        *self.credentials.slot_mut(kind) = Some(value);
    }

    pub fn credential(&self, kind: CredentialKind) -> Option<&str> {
        self.credentials
            .slot(kind)
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn is_configured(&self, kind: CredentialKind) -> bool {
        self.credential(kind).is_some()
    }

    /// Validate that every credential is present, reporting all missing ones at once.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let missing: Vec<&'static str> = CredentialKind::all()
            .iter()
            .filter(|k| !self.is_configured(**k))
            .map(|k| k.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        let get = |kind| self.credential(kind).unwrap_or_default().to_owned();

        Ok(Credentials {
            weather_api_key: get(CredentialKind::OpenWeather),
            geocoding_api_key: get(CredentialKind::OpenCage),
            suggestion_username: get(CredentialKind::GeoNames),
        })
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.location.device_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autocomplete.debounce_ms)
    }

    /// Fixed device position, if both halves are configured and in range.
    pub fn fixed_device_position(&self) -> Result<Option<(f64, f64)>, ConfigError> {
        match (self.location.device_latitude, self.location.device_longitude) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(ConfigError::InvalidValue {
                        key: "location.device_latitude",
                        reason: format!("{lat} is outside -90..=90"),
                    });
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(ConfigError::InvalidValue {
                        key: "location.device_longitude",
                        reason: format!("{lon} is outside -180..=180"),
                    });
                }
                Ok(Some((lat, lon)))
            }
            (Some(_), None) => Err(ConfigError::InvalidValue {
                key: "location.device_longitude",
                reason: "must be set together with device_latitude".into(),
            }),
            (None, Some(_)) => Err(ConfigError::InvalidValue {
                key: "location.device_latitude",
                reason: "must be set together with device_longitude".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_config() -> Config {
        let mut cfg = Config::default();
        cfg.set_credential(CredentialKind::OpenWeather, "OW_KEY".into());
        cfg.set_credential(CredentialKind::OpenCage, "OC_KEY".into());
        cfg.set_credential(CredentialKind::GeoNames, "someone".into());
        cfg
    }

    #[test]
    fn credentials_error_lists_all_missing() {
        let cfg = Config::default();
        let err = cfg.credentials().unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingCredentials(vec![
                "openweather_api_key",
                "opencage_api_key",
                "geonames_username",
            ])
        );
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let mut cfg = full_config();
        cfg.set_credential(CredentialKind::OpenCage, "   ".into());

        let err = cfg.credentials().unwrap_err();
        assert_eq!(err, ConfigError::MissingCredentials(vec!["opencage_api_key"]));
    }

    #[test]
    fn credentials_are_trimmed() {
        let mut cfg = full_config();
        cfg.set_credential(CredentialKind::OpenWeather, "  OW_KEY \n".into());

        let creds = cfg.credentials().expect("all credentials set");
        assert_eq!(creds.weather_api_key, "OW_KEY");
        assert_eq!(creds.geocoding_api_key, "OC_KEY");
        assert_eq!(creds.suggestion_username, "someone");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = full_config();
        let env: HashMap<&str, &str> =
            [("OPENWEATHERMAP_API_KEY", "FROM_ENV"), ("GEONAMES_USERNAME", "")].into();

        cfg.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.credential(CredentialKind::OpenWeather), Some("FROM_ENV"));
        assert_eq!(cfg.credential(CredentialKind::GeoNames), Some("someone"));
    }

    #[test]
    fn credential_kind_parsing() {
        for kind in CredentialKind::all() {
            assert_eq!(CredentialKind::try_from(kind.short_name()).unwrap(), *kind);
            assert_eq!(CredentialKind::try_from(kind.as_str()).unwrap(), *kind);
        }

        let err = CredentialKind::try_from("darksky").unwrap_err();
        assert!(err.to_string().contains("Unknown credential"));
    }

    #[test]
    fn defaults_match_platform_geolocation_options() {
        let cfg = Config::default();
        assert!(cfg.location.high_accuracy);
        assert_eq!(cfg.device_timeout(), Duration::from_millis(5_000));
        assert_eq!(cfg.debounce(), Duration::from_millis(300));
        assert_eq!(cfg.display.unit, TemperatureUnit::Celsius);
        assert_eq!(cfg.endpoints.weather, DEFAULT_WEATHER_URL);
    }

    #[test]
    fn fixed_device_position_requires_both_halves() {
        let mut cfg = Config::default();
        assert_eq!(cfg.fixed_device_position().unwrap(), None);

        cfg.location.device_latitude = Some(48.85);
        assert!(cfg.fixed_device_position().is_err());

        cfg.location.device_longitude = Some(2.35);
        assert_eq!(cfg.fixed_device_position().unwrap(), Some((48.85, 2.35)));

        cfg.location.device_latitude = Some(123.0);
        assert!(matches!(
            cfg.fixed_device_position(),
            Err(ConfigError::InvalidValue {
                key: "location.device_latitude",
                ..
            })
        ));
    }

    #[test]
    fn save_and_load_roundtrip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = full_config();
        cfg.autocomplete.debounce_ms = 350;
        cfg.display.unit = TemperatureUnit::Fahrenheit;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.credentials().unwrap(), cfg.credentials().unwrap());
        assert_eq!(loaded.autocomplete.debounce_ms, 350);
        assert_eq!(loaded.display.unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert!(!cfg.is_configured(CredentialKind::OpenWeather));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[credentials]\nopencage_api_key = \"abc\"\n\n[display]\nunit = \"F\"\n")
            .expect("write");

        let cfg = Config::load_from(&path).expect("load");
        assert_eq!(cfg.credential(CredentialKind::OpenCage), Some("abc"));
        assert_eq!(cfg.display.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.location, LocationConfig::default());
        assert_eq!(cfg.endpoints, Endpoints::default());
    }
}
