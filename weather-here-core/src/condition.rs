use serde::{Deserialize, Serialize};

/// Semantic icon category for an OpenWeatherMap condition code.
///
/// See: https://openweathermap.org/weather-conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    /// Mist, smoke, haze, dust, fog, ash, squalls, tornado.
    Atmosphere,
    Clear,
    Cloudy,
    /// Code outside every known group; the renderer picks its own fallback.
    Unknown,
}

impl IconCategory {
    pub fn classify(code: i64) -> Self {
        match code {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            500..=531 => Self::Rain,
            600..=622 => Self::Snow,
            701..=781 => Self::Atmosphere,
            800 => Self::Clear,
            801..=804 => Self::Cloudy,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Atmosphere => "Fog",
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Unknown => "Unknown",
        }
    }
}

pub fn classify(code: i64) -> IconCategory {
    IconCategory::classify(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_codes() {
        assert_eq!(classify(199), IconCategory::Unknown);
        assert_eq!(classify(200), IconCategory::Thunderstorm);
        assert_eq!(classify(232), IconCategory::Thunderstorm);
        assert_eq!(classify(233), IconCategory::Unknown);
        assert_eq!(classify(799), IconCategory::Unknown);
        assert_eq!(classify(800), IconCategory::Clear);
        assert_eq!(classify(801), IconCategory::Cloudy);
        assert_eq!(classify(804), IconCategory::Cloudy);
        assert_eq!(classify(805), IconCategory::Unknown);
    }

    #[test]
    fn group_edges() {
        assert_eq!(classify(300), IconCategory::Drizzle);
        assert_eq!(classify(321), IconCategory::Drizzle);
        assert_eq!(classify(500), IconCategory::Rain);
        assert_eq!(classify(531), IconCategory::Rain);
        assert_eq!(classify(600), IconCategory::Snow);
        assert_eq!(classify(622), IconCategory::Snow);
        assert_eq!(classify(700), IconCategory::Unknown);
        assert_eq!(classify(701), IconCategory::Atmosphere);
        assert_eq!(classify(781), IconCategory::Atmosphere);
    }

    #[test]
    fn total_over_provider_range() {
        for code in 200..=950 {
            let category = classify(code);
            let in_known_group = matches!(
                code,
                200..=232 | 300..=321 | 500..=531 | 600..=622 | 701..=781 | 800..=804
            );
            assert_eq!(category != IconCategory::Unknown, in_known_group, "code {code}");
        }
    }

    #[test]
    fn negative_and_huge_codes_are_unknown() {
        assert_eq!(classify(-1), IconCategory::Unknown);
        assert_eq!(classify(i64::MAX), IconCategory::Unknown);
    }

    #[test]
    fn atmosphere_reads_as_fog() {
        assert_eq!(classify(741).label(), "Fog");
        assert_eq!(IconCategory::Unknown.label(), "Unknown");
    }
}
