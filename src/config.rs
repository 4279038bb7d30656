// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE: &str = "public/data";

/// Where the exporter's files live and how loudly to log.
///
/// Layered as: defaults, then an optional YAML file, then environment
/// variables, then whatever the CLI sets on top.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory or http(s) URL holding the exported CSV files.
    pub base: String,
    pub data_file: String,
    pub metadata_file: String,
    /// Project locations for the major projects map.
    pub map_file: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            data_file: "data.csv".to_string(),
            metadata_file: "metadata.csv".to_string(),
            map_file: "major_projects_map.csv".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` if given, overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // an empty document is a valid "all defaults" config
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from `FACTBOOK_BASE`, `FACTBOOK_DATA_FILE`,
    /// `FACTBOOK_METADATA_FILE`, `FACTBOOK_MAP_FILE` and `LOG_LEVEL`.
    /// Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FACTBOOK_BASE") {
            self.base = v;
        }
        if let Some(v) = get("FACTBOOK_DATA_FILE") {
            self.data_file = v;
        }
        if let Some(v) = get("FACTBOOK_METADATA_FILE") {
            self.metadata_file = v;
        }
        if let Some(v) = get("FACTBOOK_MAP_FILE") {
            self.map_file = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
    }
}
