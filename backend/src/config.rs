//! Configuration lookup
//!
//! The option registry lives outside this crate; it is consumed through the
//! read-only [`ConfigLookup`] trait. [`DisplayConfig`] is the typed snapshot
//! the converters and the dispatcher actually read.
//!
//! # Recognized Keys
//!
//! | key                    | type            | default      |
//! |------------------------|-----------------|--------------|
//! | `chart_format`         | `svg|png|pdf`   | `svg`        |
//! | `table_display_mode`   | `console|gui|summary` | `console` |
//! | `figure_size`          | `[w, h]` inches | `[8.0, 6.0]` |
//! | `max_panels`           | int             | 20           |
//! | `gui_main_thread_only` | bool            | false        |
//! | `preview_rows`         | int             | 10           |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for option '{key}': {message}")]
    InvalidOption { key: String, message: String },

    #[error("Malformed configuration document: {0}")]
    Malformed(String),
}

/// Read-only option source
pub trait ConfigLookup {
    /// Current value of option `key`, or `None` when unset
    fn get_option(&self, key: &str) -> Option<Value>;
}

impl ConfigLookup for HashMap<String, Value> {
    fn get_option(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl ConfigLookup for serde_json::Map<String, Value> {
    fn get_option(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Serialization format for chart artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Vector output
    #[default]
    #[serde(alias = "vector")]
    Svg,
    /// Fixed-resolution raster output
    #[serde(alias = "fixed-raster", alias = "raster")]
    Png,
    /// Paginated document output
    #[serde(alias = "paginated")]
    Pdf,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
            ChartFormat::Pdf => "pdf",
        }
    }
}

/// How tables are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableDisplayMode {
    /// Print a preview to the console
    #[default]
    Console,
    /// Open the registered GUI table viewer
    Gui,
    /// Print shape and column types only
    Summary,
}

/// Typed configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub chart_format: ChartFormat,
    pub table_display_mode: TableDisplayMode,
    /// Figure size in inches (width, height)
    pub figure_size: (f64, f64),
    pub max_panels: usize,
    /// GUI windows may only be created on the designated thread
    pub gui_main_thread_only: bool,
    pub preview_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            chart_format: ChartFormat::Svg,
            table_display_mode: TableDisplayMode::Console,
            figure_size: (8.0, 6.0),
            max_panels: 20,
            gui_main_thread_only: false,
            preview_rows: 10,
        }
    }
}

impl DisplayConfig {
    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Snapshot every recognized key from an external option source
    pub fn from_lookup(lookup: &dyn ConfigLookup) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = read_option(lookup, "chart_format")? {
            config.chart_format = value;
        }
        if let Some(value) = read_option(lookup, "table_display_mode")? {
            config.table_display_mode = value;
        }
        if let Some(value) = read_option(lookup, "figure_size")? {
            config.figure_size = value;
        }
        if let Some(value) = read_option(lookup, "max_panels")? {
            config.max_panels = value;
        }
        if let Some(value) = read_option(lookup, "gui_main_thread_only")? {
            config.gui_main_thread_only = value;
        }
        if let Some(value) = read_option(lookup, "preview_rows")? {
            config.preview_rows = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.figure_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidOption {
                key: "figure_size".to_string(),
                message: format!("dimensions must be positive, got ({}, {})", width, height),
            });
        }
        if self.max_panels == 0 {
            return Err(ConfigError::InvalidOption {
                key: "max_panels".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ConfigLookup for DisplayConfig {
    fn get_option(&self, key: &str) -> Option<Value> {
        serde_json::to_value(self).ok()?.get(key).cloned()
    }
}

fn read_option<T>(lookup: &dyn ConfigLookup, key: &str) -> Result<Option<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    match lookup.get_option(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConfigError::InvalidOption {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}
