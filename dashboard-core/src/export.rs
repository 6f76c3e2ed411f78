//! Download files built from the snapshot on screen.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::NaiveDate;

use crate::{
    error::{DashboardError, Result},
    model::WeatherSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub const fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Json, ExportFormat::Csv]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = DashboardError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(DashboardError::Validation(format!(
                "Unknown export format '{value}'. Supported formats: json, csv."
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl ExportFile {
    /// Write into `dir` under the export's file name, returning the full path.
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

        let path = dir.join(&self.filename);
        fs::write(&path, &self.contents)
            .with_context(|| format!("Failed to write export file: {}", path.display()))?;

        Ok(path)
    }
}

const MAP_KEY_FIELD: &str = "map_api_key";

const CSV_HEADERS: [&str; 7] =
    ["Location", "Date", "Condition", "Temperature", "Feels Like", "Humidity", "Wind"];

/// Build the export for `snapshot`; `today` dates the file name.
pub fn export_snapshot(
    snapshot: &WeatherSnapshot,
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportFile> {
    let contents = match format {
        ExportFormat::Json => to_json(snapshot)?,
        ExportFormat::Csv => to_csv(snapshot)?,
    };

    Ok(ExportFile {
        filename: export_filename(&snapshot.location.name, format, today),
        mime_type: format.mime_type(),
        contents,
    })
}

pub fn export_filename(location_name: &str, format: ExportFormat, today: NaiveDate) -> String {
    let name: String = location_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '-' } else { c })
        .collect();
    format!("weather-data-{name}-{}.{}", today.format("%Y-%m-%d"), format.as_str())
}

fn to_json(snapshot: &WeatherSnapshot) -> Result<String> {
    let mut value = serde_json::to_value(snapshot)
        .map_err(|e| DashboardError::Decode(format!("snapshot is not serializable: {e}")))?;

    if let Some(obj) = value.as_object_mut() {
        obj.remove(MAP_KEY_FIELD);
    }

    serde_json::to_string_pretty(&value)
        .map_err(|e| DashboardError::Decode(format!("snapshot is not serializable: {e}")))
}

fn to_csv(snapshot: &WeatherSnapshot) -> Result<String> {
    let current = &snapshot.current;
    let row = [
        snapshot.location.display_name(),
        snapshot.location.localtime.clone(),
        current.condition.text.clone(),
        format!("{}°C", current.temp_c),
        format!("{}°C", current.feelslike_c),
        format!("{}%", current.humidity),
        format!("{} km/h", current.wind_kph),
    ];

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_error)?;
    writer.write_record(&row).map_err(csv_error)?;

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Decode(format!("failed to flush CSV export: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| DashboardError::Decode(format!("CSV export is not UTF-8: {e}")))?;

    Ok(text.trim_end_matches('\n').to_string())
}

fn csv_error(e: csv::Error) -> DashboardError {
    DashboardError::Decode(format!("failed to write CSV export: {e}"))
}
