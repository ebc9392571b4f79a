//! Application state machine.
//!
//! `AppState::apply` is the only way state changes. It consumes one event at a time
//! and returns the effects the runtime must start; completions come back later as
//! further events carrying the token they were issued with.

use crate::{
    autocomplete::{Autocomplete, SuggestRequest},
    error::{AppError, GeocodeError, LocationUnavailable, ProviderError},
    model::{
        CitySuggestion, Coordinate, LocationSource, ManualLocationInput, ResolutionPhase,
        ResolvedLocation, WeatherSnapshot,
    },
    resolver::{AttemptCounter, AttemptToken},
    units::TemperatureUnit,
};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Begin automatic resolution.
    Start,
    /// Restart the automatic chain, e.g. after it failed.
    RetryAutomatic,
    AutoResolved {
        token: AttemptToken,
        result: Result<ResolvedLocation, LocationUnavailable>,
    },
    ManualResolved {
        token: AttemptToken,
        result: Result<Coordinate, GeocodeError>,
    },
    WeatherFetched {
        token: AttemptToken,
        result: Result<WeatherSnapshot, ProviderError>,
    },
    SuggestionsReady {
        seq: u64,
        suggestions: Vec<CitySuggestion>,
    },
    CityInput(String),
    CountryInput(String),
    SelectSuggestion(usize),
    Submit,
    ToggleUnit,
    /// Fetch weather again for the current location.
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveAutomatic { token: AttemptToken },
    ResolveManual {
        token: AttemptToken,
        city: String,
        country: String,
    },
    FetchWeather {
        token: AttemptToken,
        coordinate: Coordinate,
    },
    Suggest(SuggestRequest),
    CancelSuggestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Automatic(AttemptToken),
    Manual(AttemptToken),
}

impl Pending {
    fn token(&self) -> AttemptToken {
        match self {
            Pending::Automatic(t) | Pending::Manual(t) => *t,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    phase: ResolutionPhase,
    location: Option<ResolvedLocation>,
    weather: Option<WeatherSnapshot>,
    unit: TemperatureUnit,
    draft: ManualLocationInput,
    autocomplete: Autocomplete,
    notice: Option<AppError>,
    resolutions: AttemptCounter,
    pending_resolution: Option<Pending>,
    fetches: AttemptCounter,
    pending_fetch: Option<AttemptToken>,
}

impl AppState {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> ResolutionPhase {
        self.phase
    }

    /// Whether the "getting your location" banner is visible.
    pub fn show(&self) -> bool {
        self.phase == ResolutionPhase::Resolving
    }

    pub fn location(&self) -> Option<&ResolvedLocation> {
        self.location.as_ref()
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn draft(&self) -> &ManualLocationInput {
        &self.draft
    }

    pub fn suggestions(&self) -> &[CitySuggestion] {
        self.autocomplete.suggestions()
    }

    pub fn notice(&self) -> Option<&AppError> {
        self.notice.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_fetch.is_some()
    }

    pub fn is_suggesting(&self) -> bool {
        self.autocomplete.is_pending()
    }

    /// True while any current request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending_resolution.is_some()
            || self.pending_fetch.is_some()
            || self.autocomplete.is_pending()
    }

    pub fn apply(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::Start | AppEvent::RetryAutomatic => self.start_automatic(),
            AppEvent::AutoResolved { token, result } => self.on_auto_resolved(token, result),
            AppEvent::ManualResolved { token, result } => self.on_manual_resolved(token, result),
            AppEvent::WeatherFetched { token, result } => {
                self.on_weather_fetched(token, result);
                Vec::new()
            }
            AppEvent::SuggestionsReady { seq, suggestions } => {
                self.autocomplete.accept(seq, suggestions);
                Vec::new()
            }
            AppEvent::CityInput(value) => {
                let request = self.autocomplete.on_input(&value);
                self.draft.city = value;
                match request {
                    Some(r) => vec![Effect::Suggest(r)],
                    None => vec![Effect::CancelSuggestions],
                }
            }
            AppEvent::CountryInput(value) => {
                self.draft.country = value;
                Vec::new()
            }
            AppEvent::SelectSuggestion(index) => match self.autocomplete.select(index) {
                Some(chosen) => {
                    self.draft = chosen.into();
                    vec![Effect::CancelSuggestions]
                }
                None => Vec::new(),
            },
            AppEvent::Submit => self.submit(),
            AppEvent::ToggleUnit => {
                self.unit = self.unit.toggled();
                if let Some(weather) = self.weather.as_mut() {
                    weather.temperature = weather.temperature.with_unit(self.unit);
                }
                Vec::new()
            }
            AppEvent::Refresh => match self.location {
                Some(location) => vec![self.fetch(location.coordinate)],
                None => {
                    tracing::debug!("refresh requested before any location was resolved");
                    Vec::new()
                }
            },
        }
    }

    fn start_automatic(&mut self) -> Vec<Effect> {
        if matches!(self.pending_resolution, Some(Pending::Automatic(_))) {
            tracing::debug!("automatic resolution already in flight");
            return Vec::new();
        }

        let token = self.resolutions.issue();
        self.pending_resolution = Some(Pending::Automatic(token));
        self.phase = ResolutionPhase::Resolving;
        vec![Effect::ResolveAutomatic { token }]
    }

    fn submit(&mut self) -> Vec<Effect> {
        if !self.draft.is_complete() {
            self.notice = Some(AppError::Validation("Please enter both city and country.".into()));
            return Vec::new();
        }

        // Supersedes any automatic attempt still running.
        let token = self.resolutions.issue();
        self.pending_resolution = Some(Pending::Manual(token));
        self.autocomplete.clear();
        self.notice = None;

        vec![
            Effect::CancelSuggestions,
            Effect::ResolveManual {
                token,
                city: self.draft.city.trim().to_string(),
                country: self.draft.country.trim().to_string(),
            },
        ]
    }

    fn is_current_resolution(&self, token: AttemptToken) -> bool {
        self.resolutions.is_current(token)
            && self.pending_resolution.map(|p| p.token()) == Some(token)
    }

    fn on_auto_resolved(
        &mut self,
        token: AttemptToken,
        result: Result<ResolvedLocation, LocationUnavailable>,
    ) -> Vec<Effect> {
        if !self.is_current_resolution(token) {
            tracing::debug!(token = token.value(), "discarding stale automatic resolution");
            return Vec::new();
        }
        self.pending_resolution = None;

        match result {
            Ok(location) => self.resolved(location),
            Err(e) => {
                tracing::warn!("{}", e);
                self.phase = ResolutionPhase::Failed;
                self.notice = Some(AppError::LocationUnavailable(e));
                Vec::new()
            }
        }
    }

    fn on_manual_resolved(
        &mut self,
        token: AttemptToken,
        result: Result<Coordinate, GeocodeError>,
    ) -> Vec<Effect> {
        if !self.is_current_resolution(token) {
            tracing::debug!(token = token.value(), "discarding stale manual resolution");
            return Vec::new();
        }
        self.pending_resolution = None;

        match result {
            Ok(coordinate) => {
                self.resolved(ResolvedLocation {
                    coordinate,
                    source: LocationSource::Manual,
                })
            }
            Err(e) => {
                tracing::warn!("manual location failed: {}", e);
                // The automatic attempt this submission replaced will never report back.
                if self.phase == ResolutionPhase::Resolving {
                    self.phase = ResolutionPhase::Failed;
                }
                self.notice = Some(e.into());
                Vec::new()
            }
        }
    }

    fn resolved(&mut self, location: ResolvedLocation) -> Vec<Effect> {
        tracing::info!(
            source = location.source.as_str(),
            coordinate = %location.coordinate,
            "location resolved"
        );
        self.phase = ResolutionPhase::Resolved;
        self.location = Some(location);
        self.notice = None;
        vec![self.fetch(location.coordinate)]
    }

    fn fetch(&mut self, coordinate: Coordinate) -> Effect {
        let token = self.fetches.issue();
        self.pending_fetch = Some(token);
        Effect::FetchWeather { token, coordinate }
    }

    fn on_weather_fetched(
        &mut self,
        token: AttemptToken,
        result: Result<WeatherSnapshot, ProviderError>,
    ) {
        if !self.fetches.is_current(token) || self.pending_fetch != Some(token) {
            tracing::debug!(token = token.value(), "discarding stale weather");
            return;
        }
        self.pending_fetch = None;

        match result {
            Ok(mut snapshot) => {
                snapshot.temperature = snapshot.temperature.with_unit(self.unit);
                self.weather = Some(snapshot);
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!(provider = e.provider(), "weather fetch failed: {}", e);
                self.notice = Some(AppError::Provider(e));
            }
        }
    }
}
