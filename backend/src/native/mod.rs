//! Host-native data model
//!
//! Converters produce these values from foreign handles:
//! - **table**: columnar [`TabularFrame`]
//! - **figure**: multi-axes [`Figure`] built from rasterized chart artifacts
//! - **graph**: directed [`AttributedGraph`]
//! - **raster**: n-dimensional [`RasterImage`]
//! - **summary**: [`ObjectSummary`] introspection snapshot (generic fallback)

pub mod figure;
pub mod graph;
pub mod raster;
pub mod summary;
pub mod table;

pub use figure::{Axes, AxesContent, Figure, GridLayout, PanelImage};
pub use graph::{AttributeMap, AttributedGraph, GraphEdge, GraphNode};
pub use raster::RasterImage;
pub use summary::ObjectSummary;
pub use table::{CellValue, Column, Dtype, TabularFrame};
