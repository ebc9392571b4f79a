//! Core library for the `weather-here` client.
//!
//! This crate defines:
//! - Location resolution (device → IP → manual entry) with stale-result guards
//! - Geocoding, place suggestions and current weather over HTTP providers
//! - Temperature units and condition classification
//! - The application state machine and the session that drives it
//!
//! It is used by `weather-here-cli`, but any front-end can drive a [`Session`] and
//! render its [`AppState`].

pub mod autocomplete;
pub mod condition;
pub mod config;
pub mod device;
pub mod error;
pub mod geocoding;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod state;
pub mod units;

pub use condition::{IconCategory, classify};
pub use config::{Config, CredentialKind, Credentials};
pub use error::{
    AppError, ConfigError, DeviceLocationError, GeocodeError, LocationUnavailable, ProviderError,
};
pub use geocoding::GeocodingClient;
pub use model::{
    CitySuggestion, Coordinate, LocationSource, ManualLocationInput, ResolutionPhase,
    ResolvedLocation, WeatherSnapshot,
};
pub use provider::WeatherProvider;
pub use resolver::LocationResolver;
pub use session::{Services, Session};
pub use state::{AppEvent, AppState, Effect};
pub use units::{Temperature, TemperatureUnit};
