//! Project configuration loaded from `.specmcp/config.toml`.
//!
//! Every field is optional; a missing file resolves to defaults.

use crate::core::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".specmcp";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_CONSTITUTION_PATH: &str = ".specify/constitution.md";
pub const DEFAULT_TRACE_PATH: &str = ".specmcp/traces.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Constitution read by `parse`, `verify` and `generate` when no path is given.
    pub constitution_path: PathBuf,
    /// Format used by `save` when none is given.
    pub save_format: String,
    /// Rule profile used by `verify`: `constitution` or `strict`.
    pub profile: String,
    /// Append a JSONL trace event per dispatched op.
    pub trace: bool,
    pub trace_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constitution_path: PathBuf::from(DEFAULT_CONSTITUTION_PATH),
            save_format: "json".to_string(),
            profile: "constitution".to_string(),
            trace: false,
            trace_path: PathBuf::from(DEFAULT_TRACE_PATH),
        }
    }
}

pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

pub fn parse_config(content: &str, origin: &Path) -> Result<Config, SpecError> {
    toml::from_str(content).map_err(|e| SpecError::InvalidConfig {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config from an explicit path, or from `<root>/.specmcp/config.toml`.
///
/// An explicit path must exist; the default location may be absent.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<Config, SpecError> {
    let config_path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(SpecError::FileNotFound(path.to_path_buf()));
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path(project_root);
            if !path.exists() {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&config_path)?;
    let config = parse_config(&content, &config_path)?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
}
