//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The client for the weather backend and its payload types
//! - Geolocation, maps script loading and snapshot export
//! - The [`Dashboard`] controller that ties them together
//!
//! It is used by `dashboard-cli`, but any front-end able to render
//! [`DashboardState`] can drive it.

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod geolocation;
pub mod maps;
pub mod model;

pub use backend::{HttpBackend, WeatherBackend, backend_from_config};
pub use config::{Config, LocationConfig};
pub use dashboard::{Dashboard, DashboardState, ReadyView, View};
pub use error::{DashboardError, Result};
pub use export::{ExportFile, ExportFormat};
pub use geolocation::{Coordinates, GeoOptions, Geolocator, LocationErrorKind, StaticGeolocator};
pub use maps::{HeadlessScriptHost, MapsLoader, ScriptHost};
pub use model::{
    HistoryRecord, LocationQuery, SearchForm, SearchHistoryEntry, SearchUpdate, WeatherSnapshot,
};
