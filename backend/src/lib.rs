//! Foreign Display Core - Rust Engine
//!
//! Converts opaque handles to objects living in a foreign runtime into
//! host-native values and renders them through a pluggable display pipeline.
//!
//! # Architecture
//!
//! - **bridge**: Capability surface of foreign handles (probe, invoke)
//! - **probe**: Structural classification (TypeProbe)
//! - **converters**: ConverterRegistry, table/chart/graph/raster converters,
//!   graph attribute extractors
//! - **panels**: Composite chart reconstruction (PanelAssembler)
//! - **display**: DisplayDispatcher state machine and display handlers
//! - **native**: Host-native data model
//! - **config**: Configuration lookup and typed snapshot
//!
//! # Critical Invariants
//!
//! 1. Classification is structural and order-sensitive, never nominal
//! 2. A ConversionResult carries a payload or an error, never both
//! 3. Scoped temporary artifacts are removed on every exit path
//! 4. `display` always produces some output and never raises for a
//!    classified value

// Module declarations
pub mod bridge;
pub mod config;
pub mod converters;
pub mod display;
pub mod native;
pub mod object;
pub mod panels;
pub mod probe;
pub mod result;

// Re-exports for convenience
pub use bridge::{try_get_capability, BridgeError, Capability, ForeignObject, ForeignRef, ForeignValue, ScriptedObject};
pub use config::{ChartFormat, ConfigError, ConfigLookup, DisplayConfig, TableDisplayMode};
pub use converters::{
    convert_generic, AttributeExtractor, ConvertOptions, Converter, ConverterInfo, ConverterRegistry, ExtractorRegistry,
    FnConverter,
};
pub use display::{DispatchState, DisplayDispatcher, DisplayOutcome, RenderError, RenderScope, TableViewer};
pub use native::{AttributedGraph, Figure, ObjectSummary, RasterImage, TabularFrame};
pub use object::DisplayObject;
pub use panels::{PanelAssembler, PanelError, PanelLayout, PanelManifest};
pub use probe::{classify, TypeTag};
pub use result::{ConversionError, ConversionResult, NativeValue, ResultKind};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn foreign_display_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyDisplayEngine>()?;
    Ok(())
}
