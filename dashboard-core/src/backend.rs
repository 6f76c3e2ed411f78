use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::Result,
    geolocation::Coordinates,
    model::{HistoryRecord, LocationQuery, SearchHistoryEntry, SearchUpdate, WeatherSnapshot},
};

pub mod http;

pub use http::HttpBackend;

/// The weather service the dashboard talks to.
///
/// Every call is a single request; retries are the caller's business.
#[async_trait]
pub trait WeatherBackend: Send + Sync + Debug {
    /// `GET /api/searches`, newest first.
    async fn list_searches(&self) -> Result<Vec<SearchHistoryEntry>>;

    /// `GET /api/searches/{id}`.
    async fn get_search(&self, id: &str) -> Result<HistoryRecord>;

    /// `DELETE /api/searches/{id}`.
    async fn delete_search(&self, id: &str) -> Result<()>;

    /// `PUT /api/searches/{id}`.
    async fn update_search(&self, id: &str, update: &SearchUpdate) -> Result<SearchHistoryEntry>;

    /// `GET /api/weather`.
    async fn weather_by_location(&self, query: &LocationQuery) -> Result<WeatherSnapshot>;

    /// `GET /api/weather/coordinates`.
    async fn weather_by_coordinates(&self, coords: Coordinates) -> Result<WeatherSnapshot>;
}

/// Construct the HTTP backend described by `config`.
pub fn backend_from_config(config: &Config) -> Result<Box<dyn WeatherBackend>> {
    let backend = HttpBackend::new(&config.backend_url, config.request_timeout())?;
    Ok(Box::new(backend))
}
