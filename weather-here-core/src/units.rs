use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

const KELVIN_OFFSET: f64 = 273.15;

/// Display unit for temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C", alias = "c")]
    Celsius,
    #[serde(rename = "F", alias = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: C, F."
            )),
        }
    }
}

pub fn to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn to_fahrenheit(kelvin: f64) -> f64 {
    kelvin * 9.0 / 5.0 - 459.67
}

pub fn convert(kelvin: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => to_celsius(kelvin),
        TemperatureUnit::Fahrenheit => to_fahrenheit(kelvin),
    }
}

/// Rounds to one decimal place. Only ever applied to values headed for display.
pub fn round_for_display(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A temperature stored canonically in Kelvin.
///
/// The displayed value is always derived from `kelvin` and `unit`; switching units
/// never touches `kelvin`, so repeated toggling cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    kelvin: f64,
    unit: TemperatureUnit,
}

impl Temperature {
    pub fn new(kelvin: f64, unit: TemperatureUnit) -> Self {
        Self { kelvin, unit }
    }

    pub fn kelvin(&self) -> f64 {
        self.kelvin
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Full-precision value in the current unit.
    pub fn degrees(&self) -> f64 {
        convert(self.kelvin, self.unit)
    }

    pub fn display_degrees(&self) -> f64 {
        round_for_display(self.degrees())
    }

    pub fn with_unit(self, unit: TemperatureUnit) -> Self {
        Self { unit, ..self }
    }

    pub fn toggled(self) -> Self {
        self.with_unit(self.unit.toggled())
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.display_degrees(), self.unit.symbol())
    }
}
