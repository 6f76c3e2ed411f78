use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{DashboardError, Result},
    geolocation::Coordinates,
    model::{HistoryRecord, LocationQuery, SearchHistoryEntry, SearchUpdate, WeatherSnapshot},
};

use super::WeatherBackend;

/// JSON-over-HTTP client for the dashboard backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            DashboardError::Validation(format!("Invalid backend URL '{base_url}': {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DashboardError::Validation(format!(
                "Invalid backend URL '{base_url}': scheme must be http or https"
            )));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn search_url(&self, id: &str) -> String {
        self.url(&format!("/api/searches/{}", urlencoding::encode(id)))
    }
}

/// Which request a response belongs to, for error messages and 404 handling.
#[derive(Debug, Clone, Copy)]
enum Endpoint<'a> {
    Searches,
    Search(&'a str),
    Weather,
    WeatherByCoordinates,
}

impl Endpoint<'_> {
    fn describe(&self) -> String {
        match self {
            Endpoint::Searches => "search history".to_string(),
            Endpoint::Search(id) => format!("search record {id}"),
            Endpoint::Weather => "weather by location".to_string(),
            Endpoint::WeatherByCoordinates => "weather by coordinates".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Pull the `detail` string out of an error body, if there is one.
fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) => Some(detail),
        _ => None,
    }
}

fn status_error(status: StatusCode, body: &str, endpoint: Endpoint<'_>) -> DashboardError {
    if status == StatusCode::NOT_FOUND && matches!(endpoint, Endpoint::Search(_)) {
        return DashboardError::NotFound(endpoint.describe());
    }

    DashboardError::Api { status: status.as_u16(), detail: parse_detail(body) }
}

async fn read_body(res: Response, endpoint: Endpoint<'_>) -> Result<String> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        tracing::debug!(%status, body = %truncate_body(&body), "{} request failed", endpoint.describe());
        return Err(status_error(status, &body, endpoint));
    }

    Ok(body)
}

async fn read_json<T: DeserializeOwned>(res: Response, endpoint: Endpoint<'_>) -> Result<T> {
    let body = read_body(res, endpoint).await?;

    serde_json::from_str(&body).map_err(|e| {
        DashboardError::Decode(format!("{}: {e} (body: {})", endpoint.describe(), truncate_body(&body)))
    })
}

#[async_trait]
impl WeatherBackend for HttpBackend {
    async fn list_searches(&self) -> Result<Vec<SearchHistoryEntry>> {
        let url = self.url("/api/searches");
        tracing::debug!(%url, "GET search history");

        let res = self.http.get(&url).send().await?;
        read_json(res, Endpoint::Searches).await
    }

    async fn get_search(&self, id: &str) -> Result<HistoryRecord> {
        let url = self.search_url(id);
        tracing::debug!(%url, "GET search record");

        let res = self.http.get(&url).send().await?;
        read_json(res, Endpoint::Search(id)).await
    }

    async fn delete_search(&self, id: &str) -> Result<()> {
        let url = self.search_url(id);
        tracing::debug!(%url, "DELETE search record");

        let res = self.http.delete(&url).send().await?;
        read_body(res, Endpoint::Search(id)).await?;
        Ok(())
    }

    async fn update_search(&self, id: &str, update: &SearchUpdate) -> Result<SearchHistoryEntry> {
        update.validate()?;

        let url = self.search_url(id);
        tracing::debug!(%url, ?update, "PUT search record");

        let res = self.http.put(&url).json(update).send().await?;
        read_json(res, Endpoint::Search(id)).await
    }

    async fn weather_by_location(&self, query: &LocationQuery) -> Result<WeatherSnapshot> {
        let url = self.url("/api/weather");
        tracing::debug!(%url, city = %query.city, state = %query.state, country = %query.country, date = ?query.date, "GET weather");

        let res = self.http.get(&url).query(&query.query_pairs()).send().await?;
        read_json(res, Endpoint::Weather).await
    }

    async fn weather_by_coordinates(&self, coords: Coordinates) -> Result<WeatherSnapshot> {
        let url = self.url("/api/weather/coordinates");
        tracing::debug!(%url, lat = coords.lat, lon = coords.lon, "GET weather by coordinates");

        // f64 Display gives the shortest form: 40.0 -> "40".
        let res = self
            .http
            .get(&url)
            .query(&[("lat", coords.lat.to_string()), ("lon", coords.lon.to_string())])
            .send()
            .await?;
        read_json(res, Endpoint::WeatherByCoordinates).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(
            parse_detail(r#"{"detail":"Weather service unavailable"}"#).as_deref(),
            Some("Weather service unavailable")
        );
    }

    #[test]
    fn non_string_detail_is_ignored() {
        assert_eq!(parse_detail(r#"{"detail":[{"loc":["query","city"]}]}"#), None);
        assert_eq!(parse_detail("<html>bad gateway</html>"), None);
        assert_eq!(parse_detail(r#"{"message":"nope"}"#), None);
    }

    #[test]
    fn not_found_only_for_search_records() {
        let err = status_error(StatusCode::NOT_FOUND, "{}", Endpoint::Search("abc"));
        assert!(err.is_not_found());

        let err = status_error(StatusCode::NOT_FOUND, "{}", Endpoint::Weather);
        assert!(matches!(err, DashboardError::Api { status: 404, .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.search_url("a b"), "http://localhost:8000/api/searches/a%20b");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = HttpBackend::new("ftp://example.com", Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("scheme must be http or https"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "°".repeat(300);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
