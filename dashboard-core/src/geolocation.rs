//! Device position lookup.
//!
//! A [`Geolocator`] answers a single position request. [`acquire`] wraps it
//! with the request options: one attempt, bounded by a timeout, no cached
//! position accepted.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationErrorKind {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("unknown geolocation error")]
    Unknown,
}

impl LocationErrorKind {
    /// Map a W3C geolocation error code (1, 2, 3) to a kind.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::Unavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Unsupported => "Geolocation is not supported on this device",
            Self::PermissionDenied => {
                "Location permission denied. Please allow location access and try again."
            }
            Self::Unavailable => "Location information is unavailable",
            Self::Timeout => "Location request timed out",
            Self::Unknown => "Failed to get your location",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    /// Oldest cached position a source may return. Zero means a fresh fix.
    pub maximum_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self, options: &GeoOptions) -> Result<Coordinates, LocationErrorKind>;
}

/// Single attempt at a position, failing with `Timeout` once `options.timeout` elapses.
pub async fn acquire(
    source: &dyn Geolocator,
    options: &GeoOptions,
) -> Result<Coordinates, LocationErrorKind> {
    match tokio::time::timeout(options.timeout, source.current_position(options)).await {
        Ok(Ok(coords)) => {
            tracing::debug!(lat = coords.lat, lon = coords.lon, "position acquired");
            Ok(coords)
        }
        Ok(Err(kind)) => {
            tracing::debug!(?kind, "position request failed");
            Err(kind)
        }
        Err(_) => {
            tracing::debug!(timeout = ?options.timeout, "position request timed out");
            Err(LocationErrorKind::Timeout)
        }
    }
}

/// Position fixed by configuration or command-line flags.
///
/// Without a position the device is treated as having no geolocation support.
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    position: Option<Coordinates>,
}

impl StaticGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self, _options: &GeoOptions) -> Result<Coordinates, LocationErrorKind> {
        self.position.ok_or(LocationErrorKind::Unsupported)
    }
}
