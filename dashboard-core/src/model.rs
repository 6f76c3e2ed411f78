//! Payloads exchanged with the weather backend, plus the search form.
//!
//! Field names follow the backend's JSON so snapshots survive a
//! deserialize/serialize cycle unchanged (the JSON export relies on that).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::{DashboardError, Result},
    geolocation::Coordinates,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: LocationInfo,
    pub current: CurrentConditions,
    #[serde(default)]
    pub forecast: Option<Forecast>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub ai_activities: Option<String>,
    #[serde(default)]
    pub ai_clothing: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Key for the maps script. Never exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_api_key: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub youtube_videos: Vec<RelatedVideo>,
}

impl WeatherSnapshot {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn forecast_days(&self) -> &[DayForecast] {
        self.forecast.as_ref().map(|f| f.forecastday.as_slice()).unwrap_or_default()
    }

    pub fn has_ai_insights(&self) -> bool {
        [&self.ai_summary, &self.ai_activities, &self.ai_clothing]
            .iter()
            .any(|text| text.as_deref().is_some_and(|t| !t.trim().is_empty()))
    }

    /// The maps key, if the backend sent a usable one.
    pub fn maps_key(&self) -> Option<&str> {
        self.map_api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    pub localtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl LocationInfo {
    pub fn display_name(&self) -> String {
        format!("{}, {}, {}", self.name, self.region, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Protocol-relative icon URL, e.g. `//cdn.weatherapi.com/...png`.
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub condition: Condition,
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: u8,
    pub wind_kph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub forecastday: Vec<DayForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: String,
    pub day: DaySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_chance_of_rain: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedVideo {
    pub video_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail_url: String,
}

pub const UNTITLED_VIDEO: &str = "Untitled video";

impl RelatedVideo {
    /// The title, or a placeholder when the backend sent none.
    pub fn display_title(&self) -> &str {
        match self.title.trim() {
            "" => UNTITLED_VIDEO,
            title => title,
        }
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// One row of the backend's search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
}

/// A stored search with the snapshot saved alongside it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "weatherData", default)]
    pub weather_data: Option<WeatherSnapshot>,
    #[serde(rename = "isHistorical", default)]
    pub is_historical: bool,
}

/// Weather lookup by place name; `date` switches to historical mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    pub state: String,
    pub country: String,
    pub date: Option<NaiveDate>,
}

impl LocationQuery {
    /// Query parameters in the order the backend documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("city", self.city.clone()),
            ("state", self.state.clone()),
            ("country", self.country.clone()),
        ];
        if let Some(date) = self.date {
            pairs.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    /// Whether this query asks for a day other than `today`.
    pub fn is_historical(&self, today: NaiveDate) -> bool {
        self.date.is_some_and(|date| date != today)
    }
}

pub const REQUIRED_FIELDS_MESSAGE: &str = "City, state, and country are required";

/// Contents of the manual search dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub city: String,
    pub state: String,
    pub country: String,
    /// Optional `YYYY-MM-DD`; empty means "now".
    pub date: String,
}

impl SearchForm {
    pub fn new(city: impl Into<String>, state: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            country: country.into(),
            date: String::new(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn from_entry(entry: &SearchHistoryEntry) -> Self {
        Self::new(entry.city.clone(), entry.state.clone(), entry.country.clone())
    }

    pub fn validate(&self) -> Result<LocationQuery> {
        let city = self.city.trim();
        let state = self.state.trim();
        let country = self.country.trim();

        if city.is_empty() || state.is_empty() || country.is_empty() {
            return Err(DashboardError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }

        let date = match self.date.trim() {
            "" => None,
            raw => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                DashboardError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD"))
            })?),
        };

        Ok(LocationQuery {
            city: city.to_string(),
            state: state.to_string(),
            country: country.to_string(),
            date,
        })
    }
}

/// Partial update of a stored search's place fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl SearchUpdate {
    pub fn validate(&self) -> Result<()> {
        let fields = [&self.city, &self.state, &self.country];

        if fields.iter().all(|f| f.is_none()) {
            return Err(DashboardError::Validation("No update data provided.".to_string()));
        }
        if fields.iter().any(|f| f.as_deref().is_some_and(|v| v.trim().is_empty())) {
            return Err(DashboardError::Validation(
                "City, state, and country cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_json() -> serde_json::Value {
        json!({
            "location": {
                "name": "London",
                "region": "City of London, Greater London",
                "country": "United Kingdom",
                "localtime": "2025-04-01 12:30",
                "lat": 51.52,
                "lon": -0.11
            },
            "current": {
                "condition": { "text": "Partly cloudy", "icon": "//cdn.weatherapi.com/116.png" },
                "temp_c": 14.0,
                "feelslike_c": 12.5,
                "humidity": 67,
                "wind_kph": 11.2
            },
            "forecast": { "forecastday": [
                { "date": "2025-04-01", "day": {
                    "maxtemp_c": 15.1, "mintemp_c": 6.3,
                    "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/113.png" }
                } }
            ] },
            "ai_summary": "Mild and cloudy.",
            "ai_activities": null,
            "ai_clothing": null,
            "latitude": 51.52,
            "longitude": -0.11,
            "map_api_key": "MAPS_KEY",
            "youtube_videos": null
        })
    }

    #[test]
    fn snapshot_parses_backend_payload() {
        let snap: WeatherSnapshot = serde_json::from_value(snapshot_json()).unwrap();

        assert_eq!(snap.location.name, "London");
        assert_eq!(snap.current.humidity, 67);
        assert_eq!(snap.forecast_days().len(), 1);
        assert!(snap.youtube_videos.is_empty());
        assert_eq!(snap.coordinates(), Some(Coordinates::new(51.52, -0.11)));
        assert_eq!(snap.maps_key(), Some("MAPS_KEY"));
        assert!(snap.has_ai_insights());
    }

    #[test]
    fn snapshot_without_optional_sections() {
        let mut value = snapshot_json();
        let obj = value.as_object_mut().unwrap();
        for key in ["forecast", "ai_summary", "latitude", "longitude", "map_api_key", "youtube_videos"] {
            obj.remove(key);
        }

        let snap: WeatherSnapshot = serde_json::from_value(value).unwrap();
        assert!(snap.forecast_days().is_empty());
        assert_eq!(snap.coordinates(), None);
        assert_eq!(snap.maps_key(), None);
        assert!(!snap.has_ai_insights());
    }

    #[test]
    fn snapshot_missing_current_is_rejected() {
        let mut value = snapshot_json();
        value.as_object_mut().unwrap().remove("current");
        assert!(serde_json::from_value::<WeatherSnapshot>(value).is_err());
    }

    #[test]
    fn videos_use_camel_case() {
        let video: RelatedVideo = serde_json::from_value(json!({
            "videoId": "abc123",
            "title": "London walk",
            "thumbnailUrl": "https://i.ytimg.com/vi/abc123/default.jpg"
        }))
        .unwrap();
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(video.display_title(), "London walk");
    }

    #[test]
    fn video_with_null_fields_keeps_snapshot() {
        let mut value = snapshot_json();
        value["youtube_videos"] = json!([
            { "videoId": "v1", "title": null, "thumbnailUrl": null },
            { "videoId": "v2" }
        ]);

        let snap: WeatherSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snap.youtube_videos.len(), 2);
        assert_eq!(snap.youtube_videos[0].title, "");
        assert_eq!(snap.youtube_videos[0].thumbnail_url, "");
        assert_eq!(snap.youtube_videos[0].display_title(), UNTITLED_VIDEO);
        assert_eq!(snap.youtube_videos[1].watch_url(), "https://www.youtube.com/watch?v=v2");
    }

    #[test]
    fn form_requires_place_fields() {
        for form in [
            SearchForm::new("", "NY", "USA"),
            SearchForm::new("New York", " ", "USA"),
            SearchForm::new("New York", "NY", ""),
        ] {
            let err = form.validate().unwrap_err();
            assert_eq!(err.to_string(), REQUIRED_FIELDS_MESSAGE);
        }
    }

    #[test]
    fn form_parses_optional_date() {
        let query = SearchForm::new(" Paris ", "Ile-de-France", "France")
            .with_date("2024-06-01")
            .validate()
            .unwrap();

        assert_eq!(query.city, "Paris");
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(query.query_pairs().last().unwrap(), &("date", "2024-06-01".to_string()));
    }

    #[test]
    fn form_rejects_malformed_date() {
        let err = SearchForm::new("Paris", "IDF", "France").with_date("06/01/2024").validate().unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn historical_only_for_other_days() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut query = SearchForm::new("Paris", "IDF", "France").validate().unwrap();
        assert!(!query.is_historical(today));

        query.date = Some(today);
        assert!(!query.is_historical(today));

        query.date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(query.is_historical(today));
    }

    #[test]
    fn update_needs_at_least_one_non_empty_field() {
        assert!(SearchUpdate::default().validate().is_err());

        let blank = SearchUpdate { city: Some("".into()), ..Default::default() };
        assert!(blank.validate().is_err());

        let ok = SearchUpdate { city: Some("Boston".into()), ..Default::default() };
        ok.validate().unwrap();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "city": "Boston" }));
    }

    #[test]
    fn history_record_accepts_null_weather_data() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "id": "rec1",
            "city": "Boston",
            "state": "MA",
            "country": "USA",
            "timestamp": "2025-04-01T10:00:00+00:00",
            "weatherData": null
        }))
        .unwrap();
        assert!(record.weather_data.is_none());
        assert!(!record.is_historical);
    }
}
