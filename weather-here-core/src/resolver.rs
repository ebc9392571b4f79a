//! Location resolver: device geolocation → IP geolocation, with manual entry as the
//! final step driven by the session.
//!
//! The resolver is stateless; ordering between overlapping attempts is enforced by
//! the caller through [`AttemptCounter`] tokens.

use std::sync::Arc;

use crate::{
    device::{DeviceLocator, GeolocationOptions},
    error::{DeviceLocationError, LocationUnavailable},
    model::{Coordinate, LocationSource, ResolvedLocation},
    provider::IpLocator,
};

/// Identifies one resolution or fetch attempt. Later attempts compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic token source. Only the most recently issued token is current.
#[derive(Debug, Clone, Default)]
pub struct AttemptCounter {
    last: u64,
}

impl AttemptCounter {
    pub fn issue(&mut self) -> AttemptToken {
        self.last += 1;
        AttemptToken(self.last)
    }

    pub fn is_current(&self, token: AttemptToken) -> bool {
        token.0 == self.last
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    device: Arc<dyn DeviceLocator>,
    ip: Arc<dyn IpLocator>,
    options: GeolocationOptions,
}

impl LocationResolver {
    pub fn new(
        device: Arc<dyn DeviceLocator>,
        ip: Arc<dyn IpLocator>,
        options: GeolocationOptions,
    ) -> Self {
        Self {
            device,
            ip,
            options,
        }
    }

    /// Run the automatic part of the chain: device first, IP on any device failure.
    pub async fn resolve_automatic(&self) -> Result<ResolvedLocation, LocationUnavailable> {
        let device_err = match self.locate_device().await {
            Ok(coordinate) => {
                tracing::info!(%coordinate, "located by device");
                return Ok(ResolvedLocation {
                    coordinate,
                    source: LocationSource::Device,
                });
            }
            Err(e) => e,
        };

        match device_err {
            DeviceLocationError::PermissionDenied => {
                tracing::warn!("device location: permission denied")
            }
            DeviceLocationError::PositionUnavailable => {
                tracing::warn!("device location: position unavailable")
            }
            DeviceLocationError::Timeout => tracing::warn!("device location: timed out"),
            DeviceLocationError::Unknown => tracing::warn!("device location: unknown error"),
        }

        match self.ip.locate().await {
            Ok(coordinate) => Ok(ResolvedLocation {
                coordinate,
                source: LocationSource::Ip,
            }),
            Err(ip) => {
                tracing::warn!(provider = ip.provider(), "IP geolocation failed: {}", ip);
                Err(LocationUnavailable {
                    device: device_err,
                    ip,
                })
            }
        }
    }

    /// Ask the platform service, enforcing the configured timeout here rather than
    /// trusting the service to honour it.
    async fn locate_device(&self) -> Result<Coordinate, DeviceLocationError> {
        let request = self.device.current_position(&self.options);
        match tokio::time::timeout(self.options.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(DeviceLocationError::Timeout),
        }
    }
}
