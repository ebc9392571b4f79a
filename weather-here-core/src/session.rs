//! Event loop driving [`AppState`].
//!
//! All transitions happen on the task that owns the [`Session`]; network work runs
//! in spawned tasks that only report back through the event queue, so no two
//! completions ever touch the state at the same time.

use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::{
    autocomplete::Debouncer,
    config::Config,
    device::{DeviceLocator, FixedDevice, GeolocationOptions, UnavailableDevice},
    geocoding::GeocodingClient,
    model::Coordinate,
    provider::{
        GeoNamesSuggester, IpApiLocator, OpenCageGeocoder, OpenWeatherProvider, WeatherProvider,
        http_client,
    },
    resolver::LocationResolver,
    state::{AppEvent, AppState, Effect},
    units::TemperatureUnit,
};

/// The collaborators a session talks to.
#[derive(Debug, Clone)]
pub struct Services {
    pub resolver: LocationResolver,
    pub geocoding: GeocodingClient,
    pub weather: Arc<dyn WeatherProvider>,
}

impl Services {
    /// Build the HTTP-backed services. Fails before any request is made if a
    /// credential is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.credentials()?;
        let endpoints = &config.endpoints;
        let http = http_client().context("Failed to build HTTP client")?;

        let device: Arc<dyn DeviceLocator> = match config.fixed_device_position()? {
            Some((lat, lon)) => Arc::new(FixedDevice::new(Coordinate::new(lat, lon))),
            None => Arc::new(UnavailableDevice),
        };
        let options = GeolocationOptions {
            high_accuracy: config.location.high_accuracy,
            timeout: config.device_timeout(),
            maximum_age: Duration::ZERO,
        };
        let ip = Arc::new(IpApiLocator::with_base_url(endpoints.ip_location.clone(), http.clone()));

        let geocoding = GeocodingClient::new(
            Arc::new(GeoNamesSuggester::with_base_url(
                credentials.suggestion_username,
                endpoints.suggestion.clone(),
                http.clone(),
            )),
            Arc::new(OpenCageGeocoder::with_base_url(
                credentials.geocoding_api_key,
                endpoints.geocoding.clone(),
                http.clone(),
            )),
        );

        let weather: Arc<dyn WeatherProvider> = Arc::new(OpenWeatherProvider::with_base_url(
            credentials.weather_api_key,
            endpoints.weather.clone(),
            http,
        ));

        Ok(Self {
            resolver: LocationResolver::new(device, ip, options),
            geocoding,
            weather,
        })
    }
}

pub struct Session {
    state: AppState,
    services: Services,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    debouncer: Debouncer,
}

impl Session {
    /// Must be called from within a tokio runtime.
    pub fn new(services: Services, unit: TemperatureUnit, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let suggestions_tx = tx.clone();
        let debouncer = Debouncer::spawn(
            services.geocoding.clone(),
            debounce,
            move |seq, suggestions| {
                let _ = suggestions_tx.send(AppEvent::SuggestionsReady { seq, suggestions });
            },
        );

        Self {
            state: AppState::new(unit),
            services,
            tx,
            rx,
            debouncer,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one event and start whatever work it calls for.
    pub fn dispatch(&mut self, event: AppEvent) {
        for effect in self.state.apply(event) {
            self.run(effect);
        }
    }

    /// Wait for the next completion and apply it.
    pub async fn next_event(&mut self) {
        if let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
    }

    /// Process completions until no current request is outstanding.
    pub async fn settle(&mut self) {
        while self.state.is_busy() {
            self.next_event().await;
        }
    }

    /// Wait for the pending suggestion lookup only. Location and weather requests
    /// keep running in the background.
    pub async fn settle_suggestions(&mut self) {
        while self.state.is_suggesting() {
            self.next_event().await;
        }
    }

    /// Apply every completion that has already arrived, without waiting.
    /// Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    fn run(&self, effect: Effect) {
        match effect {
            Effect::ResolveAutomatic { token } => {
                let resolver = self.services.resolver.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = resolver.resolve_automatic().await;
                    let _ = tx.send(AppEvent::AutoResolved { token, result });
                });
            }
            Effect::ResolveManual {
                token,
                city,
                country,
            } => {
                let geocoding = self.services.geocoding.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = geocoding.resolve(&city, &country).await;
                    let _ = tx.send(AppEvent::ManualResolved { token, result });
                });
            }
            Effect::FetchWeather { token, coordinate } => {
                let weather = self.services.weather.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = weather.current(coordinate).await;
                    let _ = tx.send(AppEvent::WeatherFetched { token, result });
                });
            }
            Effect::Suggest(request) => self.debouncer.request(request),
            Effect::CancelSuggestions => self.debouncer.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialKind;
    use crate::error::ConfigError;

    #[tokio::test]
    async fn services_require_every_credential() {
        let mut config = Config::default();
        config.set_credential(CredentialKind::OpenWeather, "key".into());

        let err = Services::from_config(&config).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().expect("config error");

        assert_eq!(
            *config_err,
            ConfigError::MissingCredentials(vec!["opencage_api_key", "geonames_username"])
        );
    }

    #[tokio::test]
    async fn services_build_from_complete_config() {
        let mut config = Config::default();
        for kind in CredentialKind::all() {
            config.set_credential(*kind, "value".into());
        }

        assert!(Services::from_config(&config).is_ok());
    }
}
