//! Capability patterns for foreign objects
//!
//! Each pattern is a side-effect-free check over capability presence. The
//! capability names are the accessor names the foreign libraries expose.

use crate::bridge::{has_all, has_any, ForeignObject};

// Tables
pub const TABLE_ROW_COUNT: &str = "getRowCount";
pub const TABLE_COLUMN_COUNT: &str = "getColumnCount";
pub const TABLE_COLUMN_HEADER: &str = "getColumnHeader";
/// `get(col, row)`
pub const TABLE_CELL: &str = "get";

// Charts
pub const CHART_SHOW: &str = "show";
pub const CHART_SAVE: &str = "save";
pub const CHART_ACCESSORS: &[&str] = &["getFrame", "getChart"];
pub const CHART_IS_COMBINED: &str = "isCombined";

/// Title accessor shared by tables and charts
pub const TITLE: &str = "getTitle";

// Graphs
pub const GRAPH_VERTEX_SET: &str = "vertexSet";
pub const GRAPH_EDGE_SET: &str = "edgeSet";
pub const GRAPH_EDGE_SOURCE: &str = "getEdgeSource";
pub const GRAPH_EDGE_TARGET: &str = "getEdgeTarget";

// GUI windows
pub const GUI_SET_VISIBLE: &str = "setVisible";
pub const GUI_NAME_HINTS: &[&str] = &["Window", "Frame", "Dialog", "Viewer"];

// Rasters
pub const RASTER_SHAPE: &str = "shape";
pub const RASTER_DTYPE: &str = "dtype";
pub const RASTER_NDIM: &str = "ndim";
pub const RASTER_DATA: &str = "tolist";

/// Row/column counts plus column headers
pub fn is_table_like(handle: &dyn ForeignObject) -> bool {
    has_all(handle, &[TABLE_ROW_COUNT, TABLE_COLUMN_COUNT, TABLE_COLUMN_HEADER])
}

/// Show and save, plus a frame or chart accessor
pub fn is_chart_like(handle: &dyn ForeignObject) -> bool {
    has_all(handle, &[CHART_SHOW, CHART_SAVE]) && has_any(handle, CHART_ACCESSORS)
}

/// Vertex set, edge set and edge endpoints
pub fn is_graph_like(handle: &dyn ForeignObject) -> bool {
    has_all(
        handle,
        &[GRAPH_VERTEX_SET, GRAPH_EDGE_SET, GRAPH_EDGE_SOURCE, GRAPH_EDGE_TARGET],
    )
}

/// Visibility toggle plus a window-ish type name
pub fn is_gui_window_like(handle: &dyn ForeignObject) -> bool {
    if !handle.has_capability(GUI_SET_VISIBLE) {
        return false;
    }
    let type_name = handle.type_name();
    GUI_NAME_HINTS.iter().any(|hint| type_name.contains(hint))
}

/// Shape, dtype and ndim
pub fn is_raster_like(handle: &dyn ForeignObject) -> bool {
    has_all(handle, &[RASTER_SHAPE, RASTER_DTYPE, RASTER_NDIM])
}
