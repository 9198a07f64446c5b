//! Converters and the ConverterRegistry
//!
//! A converter turns one family of foreign handles into a host-native value.
//! The registry is an ordered list of entries; [`ConverterRegistry::find`]
//! returns the highest-priority entry whose predicate accepts the handle.
//!
//! # Lifecycle
//!
//! Entries are registered once while the registry is being set up (usually
//! through [`ConverterRegistry::with_defaults`]) and never removed. Once the
//! registry is handed to a dispatcher it is only read.
//!
//! # Example
//!
//! ```rust
//! use foreign_display_core_rs::bridge::{ForeignValue, ScriptedObject};
//! use foreign_display_core_rs::converters::ConverterRegistry;
//!
//! let registry = ConverterRegistry::with_defaults();
//! let table = ScriptedObject::new("ResultsTable")
//!     .returning("getRowCount", ForeignValue::Int(0))
//!     .returning("getColumnCount", ForeignValue::Int(0))
//!     .returning("getColumnHeader", ForeignValue::Null);
//!
//! let converter = registry.find(&table).expect("table converter");
//! assert_eq!(converter.name(), "table");
//! ```

use crate::bridge::ForeignObject;
use crate::config::{ChartFormat, DisplayConfig};
use crate::panels::PanelLayout;
use crate::result::ConversionResult;
use serde::Serialize;
use std::collections::BTreeSet;

pub mod attributes;
pub mod chart;
pub mod generic;
pub mod graph;
pub mod raster;
pub mod table;

pub use attributes::{AttributeExtractor, ExtractorRegistry, UNKNOWN_KIND};
pub use chart::ChartConverter;
pub use generic::convert_generic;
pub use graph::GraphConverter;
pub use raster::RasterConverter;
pub use table::TableConverter;

/// Default priorities; higher wins when several predicates match
pub const TABLE_PRIORITY: i32 = 40;
pub const CHART_PRIORITY: i32 = 30;
pub const GRAPH_PRIORITY: i32 = 20;
pub const RASTER_PRIORITY: i32 = 10;

/// Per-call conversion options
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Chart serialization format; `None` uses the configured default
    pub format: Option<ChartFormat>,
    pub scale: f64,
    /// Panel cap for composite charts; `None` uses the configured default
    pub max_panels: Option<usize>,
    pub panel_layout: PanelLayout,
    pub include_metadata: bool,
    /// Explicit vertex attributes; `None` uses the detected kind's defaults
    pub node_attributes: Option<BTreeSet<String>>,
    pub edge_attributes: Option<BTreeSet<String>>,
    pub remove_self_loops: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: None,
            scale: 1.0,
            max_panels: None,
            panel_layout: PanelLayout::Auto,
            include_metadata: true,
            node_attributes: None,
            edge_attributes: None,
            remove_self_loops: true,
        }
    }
}

impl ConvertOptions {
    pub fn resolved_format(&self, config: &DisplayConfig) -> ChartFormat {
        self.format.unwrap_or(config.chart_format)
    }

    pub fn resolved_max_panels(&self, config: &DisplayConfig) -> usize {
        self.max_panels.unwrap_or(config.max_panels)
    }
}

/// A converter for one family of foreign handles
pub trait Converter {
    /// Registry name
    fn name(&self) -> &str;

    /// Name of the predicate, reported by `list_converters`
    fn predicate_name(&self) -> &str;

    /// Name of the conversion function, reported by `list_converters`
    fn converter_name(&self) -> &str;

    /// Predicate: can this converter handle `handle`? Must not mutate the handle.
    fn accepts(&self, handle: &dyn ForeignObject) -> bool;

    /// Convert `handle`; failures are reported inside the result
    fn convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions, config: &DisplayConfig) -> ConversionResult;
}

type PredicateFn = Box<dyn Fn(&dyn ForeignObject) -> bool>;
type ConvertFn = Box<dyn Fn(&dyn ForeignObject, &ConvertOptions, &DisplayConfig) -> ConversionResult>;

/// Converter assembled from a predicate and a conversion closure
pub struct FnConverter {
    name: String,
    predicate_name: String,
    converter_name: String,
    predicate: PredicateFn,
    convert: ConvertFn,
}

impl FnConverter {
    pub fn new<P, C>(name: impl Into<String>, predicate: P, convert: C) -> Self
    where
        P: Fn(&dyn ForeignObject) -> bool + 'static,
        C: Fn(&dyn ForeignObject, &ConvertOptions, &DisplayConfig) -> ConversionResult + 'static,
    {
        let name = name.into();
        Self {
            predicate_name: format!("is_{}", name),
            converter_name: format!("convert_{}", name),
            name,
            predicate: Box::new(predicate),
            convert: Box::new(convert),
        }
    }

    pub fn with_names(mut self, predicate_name: impl Into<String>, converter_name: impl Into<String>) -> Self {
        self.predicate_name = predicate_name.into();
        self.converter_name = converter_name.into();
        self
    }
}

impl Converter for FnConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate_name(&self) -> &str {
        &self.predicate_name
    }

    fn converter_name(&self) -> &str {
        &self.converter_name
    }

    fn accepts(&self, handle: &dyn ForeignObject) -> bool {
        (self.predicate)(handle)
    }

    fn convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions, config: &DisplayConfig) -> ConversionResult {
        (self.convert)(handle, options, config)
    }
}

/// Registered converter with its priority
pub struct ConverterEntry {
    converter: Box<dyn Converter>,
    priority: i32,
}

impl ConverterEntry {
    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// Public description of a registered converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterInfo {
    pub name: String,
    pub predicate_name: String,
    pub converter_name: String,
    pub priority: i32,
}

/// Ordered list of converters
#[derive(Default)]
pub struct ConverterRegistry {
    entries: Vec<ConverterEntry>,
}

impl ConverterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registry with the table, chart, graph and raster converters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TableConverter), TABLE_PRIORITY);
        registry.register(Box::new(ChartConverter), CHART_PRIORITY);
        registry.register(Box::new(GraphConverter::new()), GRAPH_PRIORITY);
        registry.register(Box::new(RasterConverter), RASTER_PRIORITY);
        registry
    }

    /// Append a converter
    pub fn register(&mut self, converter: Box<dyn Converter>, priority: i32) {
        self.entries.push(ConverterEntry { converter, priority });
    }

    /// Highest-priority converter accepting `handle`
    ///
    /// Equal priorities keep registration order (the first registered wins).
    pub fn find(&self, handle: &dyn ForeignObject) -> Option<&dyn Converter> {
        let mut best: Option<&ConverterEntry> = None;
        for entry in &self.entries {
            if !entry.converter.accepts(handle) {
                continue;
            }
            match best {
                Some(current) if current.priority >= entry.priority => {}
                _ => best = Some(entry),
            }
        }
        best.map(|entry| entry.converter.as_ref())
    }

    pub fn list(&self) -> Vec<ConverterInfo> {
        self.entries
            .iter()
            .map(|entry| ConverterInfo {
                name: entry.converter.name().to_string(),
                predicate_name: entry.converter.predicate_name().to_string(),
                converter_name: entry.converter.converter_name().to_string(),
                priority: entry.priority,
            })
            .collect()
    }

    pub fn entries(&self) -> &[ConverterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Title accessor shared by table and chart converters
pub(crate) fn read_title(handle: &dyn ForeignObject) -> Option<String> {
    let cap = crate::bridge::try_get_capability(handle, crate::probe::patterns::TITLE)?;
    match cap.call0() {
        Ok(value) => value.as_str().map(str::to_string).filter(|t| !t.trim().is_empty()),
        Err(e) => {
            tracing::debug!("Title accessor failed on {}: {}", handle.type_name(), e);
            None
        }
    }
}
