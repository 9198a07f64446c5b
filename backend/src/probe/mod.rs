//! TypeProbe - structural classification
//!
//! Decides what a value represents without consulting nominal type
//! information. The chain runs in a fixed order:
//!
//! 1. Native values (already host-side, no foreign interaction)
//! 2. Conversion results, classified by payload
//! 3. Foreign patterns: table → chart → graph → GUI window → raster
//! 4. `Unknown`
//!
//! # Critical Invariant
//!
//! Foreign patterns overlap (a chart and a window both expose `show`-like
//! capabilities), so the order in [`FOREIGN_PATTERNS`] is significant: more
//! specific patterns are tested before general ones.

use crate::bridge::ForeignObject;
use crate::object::DisplayObject;
use crate::result::NativeValue;
use serde::Serialize;
use std::fmt;

pub mod patterns;

pub use patterns::{is_chart_like, is_graph_like, is_gui_window_like, is_raster_like, is_table_like};

/// Resolved semantic kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    // Host-native values
    NativeFigure,
    NativeTable,
    NativeGraph,
    NativeRaster,
    NativeSummary,

    // Payloads of earlier conversion results
    ChartDerived,
    TableDerived,
    GraphDerived,
    RasterDerived,
    SummaryDerived,
    /// Conversion result without payload (failed or empty)
    EmptyResult,

    // Foreign patterns
    Table,
    Chart,
    Graph,
    GuiWindow,
    Raster,

    Collection,
    Unknown,
}

impl TypeTag {
    /// Tags that require a converter before rendering
    pub fn is_foreign_pattern(&self) -> bool {
        matches!(
            self,
            TypeTag::Table
                | TypeTag::Chart
                | TypeTag::Graph
                | TypeTag::GuiWindow
                | TypeTag::Raster
                | TypeTag::Unknown
        )
    }

    pub fn is_native(&self) -> bool {
        matches!(
            self,
            TypeTag::NativeFigure
                | TypeTag::NativeTable
                | TypeTag::NativeGraph
                | TypeTag::NativeRaster
                | TypeTag::NativeSummary
        )
    }

    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            TypeTag::ChartDerived
                | TypeTag::TableDerived
                | TypeTag::GraphDerived
                | TypeTag::RasterDerived
                | TypeTag::SummaryDerived
                | TypeTag::EmptyResult
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::NativeFigure => "native_figure",
            TypeTag::NativeTable => "native_table",
            TypeTag::NativeGraph => "native_graph",
            TypeTag::NativeRaster => "native_raster",
            TypeTag::NativeSummary => "native_summary",
            TypeTag::ChartDerived => "chart_derived",
            TypeTag::TableDerived => "table_derived",
            TypeTag::GraphDerived => "graph_derived",
            TypeTag::RasterDerived => "raster_derived",
            TypeTag::SummaryDerived => "summary_derived",
            TypeTag::EmptyResult => "empty_result",
            TypeTag::Table => "table",
            TypeTag::Chart => "chart",
            TypeTag::Graph => "graph",
            TypeTag::GuiWindow => "gui_window",
            TypeTag::Raster => "raster",
            TypeTag::Collection => "collection",
            TypeTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named foreign pattern
pub struct ProbePattern {
    pub tag: TypeTag,
    pub name: &'static str,
    pub matches: fn(&dyn ForeignObject) -> bool,
}

/// Foreign patterns in priority order
pub const FOREIGN_PATTERNS: [ProbePattern; 5] = [
    ProbePattern {
        tag: TypeTag::Table,
        name: "table",
        matches: is_table_like,
    },
    ProbePattern {
        tag: TypeTag::Chart,
        name: "chart",
        matches: is_chart_like,
    },
    ProbePattern {
        tag: TypeTag::Graph,
        name: "graph",
        matches: is_graph_like,
    },
    ProbePattern {
        tag: TypeTag::GuiWindow,
        name: "gui_window",
        matches: is_gui_window_like,
    },
    ProbePattern {
        tag: TypeTag::Raster,
        name: "raster",
        matches: is_raster_like,
    },
];

/// Classify any displayable value
pub fn classify(obj: &DisplayObject) -> TypeTag {
    match obj {
        DisplayObject::Native(value) => classify_native(value),
        DisplayObject::Converted(result) => match result.payload() {
            Some(payload) => classify_payload(payload),
            None => TypeTag::EmptyResult,
        },
        DisplayObject::Foreign(handle) => classify_handle(handle.as_ref()),
        DisplayObject::Sequence(_) => TypeTag::Collection,
    }
}

/// Run the foreign pattern chain over a handle
pub fn classify_handle(handle: &dyn ForeignObject) -> TypeTag {
    FOREIGN_PATTERNS
        .iter()
        .find(|pattern| (pattern.matches)(handle))
        .map(|pattern| pattern.tag)
        .unwrap_or(TypeTag::Unknown)
}

pub fn classify_native(value: &NativeValue) -> TypeTag {
    match value {
        NativeValue::Figure(_) => TypeTag::NativeFigure,
        NativeValue::Table(_) => TypeTag::NativeTable,
        NativeValue::Graph(_) => TypeTag::NativeGraph,
        NativeValue::Raster(_) => TypeTag::NativeRaster,
        NativeValue::Generic(_) => TypeTag::NativeSummary,
    }
}

/// Fixed lookup from payload type to derived tag
pub fn classify_payload(payload: &NativeValue) -> TypeTag {
    match payload {
        NativeValue::Figure(_) => TypeTag::ChartDerived,
        NativeValue::Graph(_) => TypeTag::GraphDerived,
        NativeValue::Table(_) => TypeTag::TableDerived,
        NativeValue::Raster(_) => TypeTag::RasterDerived,
        NativeValue::Generic(_) => TypeTag::SummaryDerived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ForeignValue, ScriptedObject};

    fn with_caps(type_name: &str, caps: &[&str]) -> ScriptedObject {
        caps.iter()
            .fold(ScriptedObject::new(type_name), |obj, cap| obj.returning(*cap, ForeignValue::Null))
    }

    #[test]
    fn test_pattern_order_is_fixed() {
        let names: Vec<&str> = FOREIGN_PATTERNS.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["table", "chart", "graph", "gui_window", "raster"]);
    }

    #[test]
    fn test_chart_wins_over_window() {
        // A chart frame also exposes setVisible and has a window-ish name
        let obj = with_caps("ChartFrame", &["show", "save", "getFrame", "setVisible"]);
        assert_eq!(classify_handle(&obj), TypeTag::Chart);
    }

    #[test]
    fn test_window_needs_name_hint() {
        let named = with_caps("ImageWindow", &["setVisible"]);
        let unnamed = with_caps("Roi", &["setVisible"]);
        assert_eq!(classify_handle(&named), TypeTag::GuiWindow);
        assert_eq!(classify_handle(&unnamed), TypeTag::Unknown);
    }

    #[test]
    fn test_chart_needs_accessor() {
        let obj = with_caps("Plot", &["show", "save"]);
        assert_eq!(classify_handle(&obj), TypeTag::Unknown);
    }

    #[test]
    fn test_foreign_pattern_tags() {
        assert!(TypeTag::Unknown.is_foreign_pattern());
        assert!(TypeTag::GuiWindow.is_foreign_pattern());
        assert!(!TypeTag::TableDerived.is_foreign_pattern());
        assert!(!TypeTag::NativeFigure.is_foreign_pattern());
        assert!(!TypeTag::Collection.is_foreign_pattern());
    }
}
