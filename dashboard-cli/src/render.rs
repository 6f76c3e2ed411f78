//! Plain-text rendering of the dashboard state.

use chrono::NaiveDate;
use dashboard_core::{DashboardState, ReadyView, SearchHistoryEntry, View, model::DayForecast};

/// The primary view, as it should appear on screen.
pub fn view(state: &DashboardState) -> String {
    match state.view() {
        View::Loading => state.loading_message().to_string(),
        View::LocationError(msg) | View::DataError(msg) => {
            format!("Error: {msg}\nTry `weather-dashboard search` to look up a location.")
        }
        View::Ready(ready) => snapshot(ready, state.maps_loaded()),
        View::Empty => {
            "No weather data available. Please search for a location.".to_string()
        }
    }
}

pub fn snapshot(ready: &ReadyView, maps_loaded: bool) -> String {
    let snap = &ready.snapshot;
    let current = &snap.current;

    let mut heading = snap.location.display_name();
    if ready.historical {
        heading.push_str("  [historical]");
    }
    let mut lines = vec![
        heading,
        format!("Local time: {}", snap.location.localtime),
        format!(
            "{}  {}°C (feels like {}°C)",
            current.condition.text, current.temp_c, current.feelslike_c
        ),
        format!("Humidity {}%  Wind {} km/h", current.humidity, current.wind_kph),
    ];

    // A single day is just today again.
    let days = snap.forecast_days();
    if days.len() > 1 {
        lines.push("\nForecast".to_string());
        lines.extend(days.iter().map(|day| format!("  {}", forecast_line(day))));
    }

    if snap.has_ai_insights() {
        lines.push("\nAI insights".to_string());
        for (label, text) in [
            ("Summary", &snap.ai_summary),
            ("Activities", &snap.ai_activities),
            ("What to wear", &snap.ai_clothing),
        ] {
            if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
                lines.push(format!("  {label}: {}", text.trim()));
            }
        }
    }

    if !snap.youtube_videos.is_empty() {
        lines.push("\nVideos".to_string());
        lines.extend(
            snap.youtube_videos
                .iter()
                .map(|video| format!("  {} - {}", video.display_title(), video.watch_url())),
        );
    }

    if let Some(coords) = snap.coordinates() {
        lines.push("\nMap".to_string());
        lines.push(format!(
            "  https://www.google.com/maps/search/?api=1&query={},{}",
            coords.lat, coords.lon
        ));
        if !maps_loaded {
            lines.push("  (interactive map unavailable)".to_string());
        }
    }

    lines.join("\n")
}

fn forecast_line(day: &DayForecast) -> String {
    let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
        .map(|d| d.format("%a, %b %-d").to_string())
        .unwrap_or_else(|_| day.date.clone());

    let mut line = format!(
        "{date:<12} {:<24} {}° / {}°",
        day.day.condition.text, day.day.maxtemp_c, day.day.mintemp_c
    );
    if let Some(rain) = day.day.daily_chance_of_rain {
        line.push_str(&format!("  {rain}% rain"));
    }
    line
}

pub fn history(entries: &[SearchHistoryEntry]) -> String {
    if entries.is_empty() {
        return "No search history found".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}, {}, {}  ({})",
                entry.id,
                entry.city,
                entry.state,
                entry.country,
                entry.timestamp.format("%b %-d, %Y, %-I:%M %p UTC")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dashboard_core::{
        WeatherSnapshot,
        model::{Condition, CurrentConditions, DaySummary, Forecast, LocationInfo, RelatedVideo},
    };

    fn ready(historical: bool) -> ReadyView {
        let day = |date: &str| DayForecast {
            date: date.into(),
            day: DaySummary {
                maxtemp_c: 15.0,
                mintemp_c: 6.5,
                condition: Condition { text: "Sunny".into(), icon: "//cdn/113.png".into() },
                daily_chance_of_rain: Some(10.0),
            },
        };

        ReadyView {
            snapshot: WeatherSnapshot {
                location: LocationInfo {
                    name: "Paris".into(),
                    region: "Ile-de-France".into(),
                    country: "France".into(),
                    localtime: "2025-04-01 14:00".into(),
                    lat: None,
                    lon: None,
                },
                current: CurrentConditions {
                    condition: Condition { text: "Clear".into(), icon: "//cdn/113.png".into() },
                    temp_c: 17.0,
                    feelslike_c: 16.5,
                    humidity: 48,
                    wind_kph: 7.2,
                },
                forecast: Some(Forecast { forecastday: vec![day("2025-04-01"), day("2025-04-02")] }),
                ai_summary: Some("Pleasant afternoon.".into()),
                ai_activities: None,
                ai_clothing: Some("A light jacket.".into()),
                latitude: Some(48.8566),
                longitude: Some(2.3522),
                map_api_key: Some("KEY".into()),
                youtube_videos: vec![RelatedVideo {
                    video_id: "abc".into(),
                    title: "Paris in spring".into(),
                    thumbnail_url: "https://i.ytimg.com/vi/abc/default.jpg".into(),
                }],
            },
            historical,
        }
    }

    #[test]
    fn snapshot_shows_all_sections() {
        let text = snapshot(&ready(false), true);

        assert!(text.starts_with("Paris, Ile-de-France, France\n"));
        assert!(text.contains("Clear  17°C (feels like 16.5°C)"));
        assert!(text.contains("Humidity 48%  Wind 7.2 km/h"));
        assert!(text.contains("Tue, Apr 1"));
        assert!(text.contains("10% rain"));
        assert!(text.contains("Summary: Pleasant afternoon."));
        assert!(!text.contains("Activities:"));
        assert!(text.contains("https://www.youtube.com/watch?v=abc"));
        assert!(text.contains("query=48.8566,2.3522"));
        assert!(!text.contains("interactive map unavailable"));
        assert!(!text.contains("KEY"));
    }

    #[test]
    fn historical_marker_and_missing_map() {
        let text = snapshot(&ready(true), false);
        assert!(text.lines().next().unwrap().ends_with("[historical]"));
        assert!(text.contains("interactive map unavailable"));
    }

    #[test]
    fn single_forecast_day_is_hidden() {
        let mut view = ready(false);
        view.snapshot.forecast = Some(Forecast { forecastday: vec![view.snapshot.forecast_days()[0].clone()] });
        assert!(!snapshot(&view, true).contains("Forecast"));
    }

    #[test]
    fn untitled_video_gets_placeholder() {
        let mut view = ready(false);
        view.snapshot.youtube_videos[0].title = String::new();
        assert!(snapshot(&view, true).contains("  Untitled video - https://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn empty_history() {
        assert_eq!(history(&[]), "No search history found");
    }

    #[test]
    fn history_lines() {
        let entries = vec![SearchHistoryEntry {
            id: "rec1".into(),
            city: "Boston".into(),
            state: "MA".into(),
            country: "USA".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, 1, 15, 5, 0).unwrap(),
        }];
        assert_eq!(history(&entries), "rec1  Boston, MA, USA  (Apr 1, 2025, 3:05 PM UTC)");
    }
}
