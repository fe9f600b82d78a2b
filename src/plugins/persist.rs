//! Saving and loading OpenAPI-shaped documents.
//!
//! There is no file locking: concurrent writers to one path race and the
//! last write wins.

use crate::core::error::SpecError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    Json,
    Yaml,
}

impl SaveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Yaml => "yaml",
        }
    }

    /// Guess from a file extension; anything but `.yaml`/`.yml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => SaveFormat::Yaml,
            _ => SaveFormat::Json,
        }
    }
}

impl FromStr for SaveFormat {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(SaveFormat::Json),
            "yaml" => Ok(SaveFormat::Yaml),
            other => Err(SpecError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub file_path: String,
    pub file_size: u64,
    pub format: SaveFormat,
    pub message: String,
}

/// Render a document in `format`. JSON uses 2-space indentation.
pub fn render(spec: &Value, format: SaveFormat) -> Result<String, SpecError> {
    match format {
        SaveFormat::Json => Ok(serde_json::to_string_pretty(spec)?),
        SaveFormat::Yaml => render_yaml(spec),
    }
}

#[cfg(feature = "yaml")]
fn render_yaml(spec: &Value) -> Result<String, SpecError> {
    serde_yaml::to_string(spec).map_err(|e| SpecError::InvalidYaml(e.to_string()))
}

#[cfg(not(feature = "yaml"))]
fn render_yaml(_spec: &Value) -> Result<String, SpecError> {
    Err(SpecError::MissingDependency(
        "YAML support was not compiled in".to_string(),
    ))
}

#[cfg(feature = "yaml")]
fn parse_yaml(content: &str) -> Result<Value, SpecError> {
    serde_yaml::from_str(content).map_err(|e| SpecError::InvalidYaml(e.to_string()))
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_content: &str) -> Result<Value, SpecError> {
    Err(SpecError::MissingDependency(
        "YAML support was not compiled in".to_string(),
    ))
}

/// Validate `spec_json`, then write it to `output_path` in `format`.
///
/// Validation happens before any filesystem change, so a rejected call never
/// leaves directories or partial files behind.
pub fn save(spec_json: &str, output_path: &Path, format: &str) -> Result<SaveReceipt, SpecError> {
    let format = SaveFormat::from_str(format)?;
    let spec: Value = serde_json::from_str(spec_json)?;
    let rendered = render(&spec, format)?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, rendered)?;

    let file_size = fs::metadata(output_path)?.len();
    let absolute = std::path::absolute(output_path).unwrap_or_else(|_| output_path.to_path_buf());
    tracing::info!(path = %absolute.display(), format = format.as_str(), file_size, "saved spec");

    Ok(SaveReceipt {
        file_path: absolute.display().to_string(),
        file_size,
        format,
        message: format!("Spec saved to {}", output_path.display()),
    })
}

/// Read a saved document back. The format follows the file extension.
pub fn load(path: &Path) -> Result<Value, SpecError> {
    if !path.exists() {
        return Err(SpecError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    match SaveFormat::from_path(path) {
        SaveFormat::Json => Ok(serde_json::from_str(&content)?),
        SaveFormat::Yaml => parse_yaml(&content),
    }
}
