//! Platform location service abstraction.

use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

use crate::{error::DeviceLocationError, model::Coordinate};

/// Options passed to the platform location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position the service may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(5_000),
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinate, DeviceLocationError>;
}

/// Host without a location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDevice;

#[async_trait]
impl DeviceLocator for UnavailableDevice {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinate, DeviceLocationError> {
        Err(DeviceLocationError::PositionUnavailable)
    }
}

/// Reports a position fixed in configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDevice {
    position: Coordinate,
}

impl FixedDevice {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl DeviceLocator for FixedDevice {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinate, DeviceLocationError> {
        Ok(self.position)
    }
}
