//! Human-friendly text rendering of the application state.

use chrono::Local;

use weather_here_core::{AppState, IconCategory, ResolutionPhase};

fn glyph(icon: IconCategory) -> &'static str {
    match icon {
        IconCategory::Thunderstorm => "⛈",
        IconCategory::Drizzle => "🌦",
        IconCategory::Rain => "🌧",
        IconCategory::Snow => "❄",
        IconCategory::Atmosphere => "🌫",
        IconCategory::Clear => "☀",
        IconCategory::Cloudy => "☁",
        IconCategory::Unknown => "·",
    }
}

pub fn render(state: &AppState) -> String {
    if state.show() {
        return "Trying to get your location...\n".to_string();
    }

    let mut out = match state.weather() {
        Some(weather) => {
            let observed = weather
                .observed_at
                .map(|at| format!(" (observed {})", at.with_timezone(&Local).format("%H:%M")))
                .unwrap_or_default();
            format!(
                "{} {}\n   {}\n   Location: {}{}\n",
                glyph(weather.icon()),
                weather.headline(),
                weather.temperature,
                weather.location_label(),
                observed
            )
        }
        None if state.is_fetching() => "Loading weather...\n".to_string(),
        None if state.phase() == ResolutionPhase::Failed => String::new(),
        None => "No weather yet.\n".to_string(),
    };

    if let Some(notice) = state.notice() {
        out.push_str(&format!("! {}\n", notice.user_message()));
        tracing::debug!("notice detail: {}", notice);
    }

    out
}
