//! Error types shared across the crate.
//!
//! Provider-level failures are typed so the session can decide whether to advance
//! the fallback chain, surface a notice, or discard the result. `AppError` is the
//! user-visible taxonomy the renderer shows.

use thiserror::Error;

/// Failure talking to any external HTTP provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} rejected the credentials (status {status})")]
    Unauthorized { provider: &'static str, status: u16 },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Timeout { provider }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Unauthorized { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Decode { provider, .. } => provider,
        }
    }

    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

/// Platform location service failure. All four kinds advance the chain the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceLocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Unknown location error")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("Could not find coordinates for '{query}'")]
    NotFound { query: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Every automatic strategy failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not determine location automatically (device: {device}; ip: {ip})")]
pub struct LocationUnavailable {
    pub device: DeviceLocationError,
    pub ip: ProviderError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// User-visible failure recorded by the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error(transparent)]
    LocationUnavailable(#[from] LocationUnavailable),

    #[error("Could not find coordinates for '{0}'")]
    GeocodeNotFound(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Validation(String),
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound { query } => AppError::GeocodeNotFound(query),
            GeocodeError::Provider(e) => AppError::Provider(e),
        }
    }
}

impl AppError {
    /// Short, actionable message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::LocationUnavailable(_) => {
                "Could not detect your location. Please enter a city and country."
            }
            AppError::GeocodeNotFound(_) => {
                "Could not find coordinates for the specified location."
            }
            AppError::Provider(e @ ProviderError::Timeout { .. }) => match e.provider() {
                "openweather" => "The weather service took too long to answer. Please try again.",
                _ => "The location service took too long to answer. Please try again.",
            },
            AppError::Provider(ProviderError::Unauthorized { .. }) => {
                "A service rejected the configured credentials. Check your configuration."
            }
            AppError::Provider(_) => "A network request failed. Please try again.",
            AppError::Validation(_) => "Please enter both city and country.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_lists_every_name() {
        let err = ConfigError::MissingCredentials(vec!["openweather_api_key", "geonames_username"]);
        assert_eq!(
            err.to_string(),
            "Missing required credentials: openweather_api_key, geonames_username"
        );
    }

    #[test]
    fn geocode_error_maps_into_app_error() {
        let not_found: AppError = GeocodeError::NotFound {
            query: "Atlantis, Sea".into(),
        }
        .into();
        assert_eq!(not_found, AppError::GeocodeNotFound("Atlantis, Sea".into()));

        let provider: AppError = GeocodeError::Provider(ProviderError::Timeout {
            provider: "opencage",
        })
        .into();
        assert!(matches!(provider, AppError::Provider(ProviderError::Timeout { .. })));
    }

    #[test]
    fn user_messages() {
        let unavailable = AppError::LocationUnavailable(LocationUnavailable {
            device: DeviceLocationError::PermissionDenied,
            ip: ProviderError::Transport {
                provider: "ipapi",
                message: "refused".into(),
            },
        });
        assert!(unavailable.user_message().contains("enter a city and country"));
        assert!(unavailable.to_string().contains("Location permission denied"));

        let slow_weather = AppError::Provider(ProviderError::Timeout {
            provider: "openweather",
        });
        assert!(slow_weather.user_message().starts_with("The weather service"));
        let slow_geocoder = AppError::Provider(ProviderError::Timeout {
            provider: "opencage",
        });
        assert!(slow_geocoder.user_message().starts_with("The location service"));

        let validation = AppError::Validation("city is empty".into());
        assert_eq!(validation.user_message(), "Please enter both city and country.");
    }
}
