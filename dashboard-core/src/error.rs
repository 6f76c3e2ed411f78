//! Error types shared by the backend client, geolocation and the dashboard.

use thiserror::Error;

use crate::geolocation::LocationErrorKind;

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("request to weather backend failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("weather backend returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Location(#[from] LocationErrorKind),

    #[error("unexpected response from weather backend: {0}")]
    Decode(String),

    #[error("failed to load maps script: {0}")]
    Maps(String),
}

impl DashboardError {
    /// Message shown to the user in place of the failed view.
    ///
    /// A `detail` sent by the backend wins; errors without a message of their
    /// own fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Api { detail: Some(detail), .. } if !detail.trim().is_empty() => detail.clone(),
            Self::NotFound(_) => "Search record not found".to_string(),
            Self::Location(kind) => kind.message().to_string(),
            Self::Api { .. } | Self::Network(_) | Self::Decode(_) | Self::Maps(_) => {
                fallback.to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_detail_is_used_verbatim() {
        let err = DashboardError::Api {
            status: 400,
            detail: Some("Location not found: Nowhere, XX, YY".into()),
        };
        assert_eq!(err.user_message("Failed to fetch weather data"), "Location not found: Nowhere, XX, YY");
    }

    #[test]
    fn missing_detail_falls_back() {
        let err = DashboardError::Api { status: 503, detail: None };
        assert_eq!(err.user_message("Failed to fetch weather data"), "Failed to fetch weather data");

        let err = DashboardError::Api { status: 500, detail: Some("  ".into()) };
        assert_eq!(err.user_message("generic"), "generic");
    }

    #[test]
    fn not_found_has_its_own_message() {
        let err = DashboardError::NotFound("search abc".into());
        assert!(err.is_not_found());
        assert_eq!(err.user_message("Failed to fetch search record"), "Search record not found");
    }

    #[test]
    fn location_errors_use_kind_message() {
        let err = DashboardError::from(LocationErrorKind::Timeout);
        assert_eq!(err.user_message("unused"), "Location request timed out");
    }

    #[test]
    fn display_includes_status_and_detail() {
        let err = DashboardError::Api { status: 503, detail: Some("Weather service unavailable".into()) };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("Weather service unavailable"));
    }
}
