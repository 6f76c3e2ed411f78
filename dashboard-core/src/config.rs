use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::geolocation::{Coordinates, GeoOptions};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// A fixed device position, used when no live geolocation is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationConfig {
    /// A position checked to be on the globe.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude {latitude} is out of range (-90..=90)");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude {longitude} is out of range (-180..=180)");
        }
        Ok(Self { latitude, longitude })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// backend_url = "http://localhost:8000"
/// request_timeout_secs = 15
///
/// [location]
/// latitude = 40.7128
/// longitude = -74.006
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Origin of the weather backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_geolocation_timeout_secs")]
    pub geolocation_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationConfig>,

    /// Where exports are written; the working directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_geolocation_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            geolocation_timeout_secs: default_geolocation_timeout_secs(),
            location: None,
            export_dir: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn geo_options(&self) -> GeoOptions {
        GeoOptions {
            timeout: Duration::from_secs(self.geolocation_timeout_secs.max(1)),
            ..GeoOptions::default()
        }
    }

    pub fn fixed_position(&self) -> Option<Coordinates> {
        self.location.as_ref().map(LocationConfig::coordinates)
    }

    /// Store a fixed position after checking it is on the globe.
    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        self.location = Some(LocationConfig::new(latitude, longitude)?);
        Ok(())
    }

    pub fn set_backend_url(&mut self, url: &str) -> Result<()> {
        let trimmed = url.trim();
        let parsed = reqwest::Url::parse(trimmed)
            .with_context(|| format!("Invalid backend URL: {trimmed}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Backend URL must use http or https: {trimmed}");
        }
        self.backend_url = trimmed.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file yet.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
