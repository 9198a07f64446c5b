//! Display handler registry
//!
//! Maps a resolved [`TypeTag`] to a render function. Registration is
//! last-writer-wins; [`HandlerRegistry::with_defaults`] installs a handler
//! for every native and derived tag plus GUI windows. `Unknown` has no
//! default handler, so unrecognized handles end at the generic printer.

use super::dispatcher::RenderScope;
use super::printer;
use super::viewer;
use super::RenderError;
use crate::bridge::{require_capability, ForeignValue};
use crate::config::TableDisplayMode;
use crate::converters::graph::DEFAULT_LAYOUT;
use crate::native::TabularFrame;
use crate::object::DisplayObject;
use crate::probe::patterns::GUI_SET_VISIBLE;
use crate::probe::TypeTag;
use crate::result::NativeValue;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Render function for one tag
pub type RenderFn = Rc<dyn Fn(&DisplayObject, &mut RenderScope<'_>) -> Result<(), RenderError>>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TypeTag, RenderFn>,
}

impl HandlerRegistry {
    /// Registry without handlers
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for tag in [TypeTag::NativeTable, TypeTag::TableDerived] {
            registry.register(tag, render_table);
        }
        for tag in [TypeTag::NativeFigure, TypeTag::ChartDerived] {
            registry.register(tag, render_figure);
        }
        for tag in [TypeTag::NativeGraph, TypeTag::GraphDerived] {
            registry.register(tag, render_graph);
        }
        for tag in [TypeTag::NativeRaster, TypeTag::RasterDerived] {
            registry.register(tag, render_raster);
        }
        for tag in [TypeTag::NativeSummary, TypeTag::SummaryDerived] {
            registry.register(tag, render_summary);
        }
        registry.register(TypeTag::EmptyResult, render_empty);
        registry.register(TypeTag::GuiWindow, render_gui_window);
        registry
    }

    /// Install `handler` for `tag`, replacing any previous one
    pub fn register<F>(&mut self, tag: TypeTag, handler: F)
    where
        F: Fn(&DisplayObject, &mut RenderScope<'_>) -> Result<(), RenderError> + 'static,
    {
        if self.handlers.insert(tag, Rc::new(handler)).is_some() {
            debug!("Display handler for '{}' replaced", tag);
        }
    }

    pub fn get(&self, tag: TypeTag) -> Option<RenderFn> {
        self.handlers.get(&tag).cloned()
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn payload<'a>(obj: &'a DisplayObject) -> Result<&'a NativeValue, RenderError> {
    obj.native_value()
        .ok_or_else(|| RenderError::Failed(format!("{} carries no native value", obj.type_label())))
}

fn metadata_str<'a>(obj: &'a DisplayObject, key: &str) -> Option<&'a str> {
    obj.as_conversion()?.metadata().get(key)?.as_str()
}

fn render_table(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    let NativeValue::Table(frame) = payload(obj)? else {
        return Err(RenderError::Failed("expected a table".to_string()));
    };
    let title = metadata_str(obj, "title");
    let config = scope.config().clone();

    match config.table_display_mode {
        TableDisplayMode::Summary => printer::write_table_summary(scope.out(), frame, title)?,
        TableDisplayMode::Gui => {
            if launch_viewer(scope, frame, title)? {
                return Ok(());
            }
            printer::write_table_preview(scope.out(), frame, config.preview_rows, title)?;
        }
        TableDisplayMode::Console => printer::write_table_preview(scope.out(), frame, config.preview_rows, title)?,
    }
    Ok(())
}

/// Launch the GUI viewer when one is installed and allowed; false means
/// the caller should print to the console instead
fn launch_viewer(scope: &RenderScope<'_>, frame: &TabularFrame, title: Option<&str>) -> Result<bool, RenderError> {
    if scope.config().gui_main_thread_only {
        debug!("GUI restricted to the designated thread; printing table to console");
        return Ok(false);
    }
    let Some(table_viewer) = scope.table_viewer() else {
        warn!("Table display mode is gui but no table viewer is installed");
        return Ok(false);
    };
    viewer::launch(table_viewer, frame.clone(), title.map(str::to_string))?;
    Ok(true)
}

fn render_figure(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    match payload(obj)? {
        NativeValue::Figure(figure) => Ok(printer::write_figure_summary(scope.out(), figure)?),
        _ => Err(RenderError::Failed("expected a figure".to_string())),
    }
}

fn render_graph(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    let layout = metadata_str(obj, "layout").unwrap_or(DEFAULT_LAYOUT);
    match payload(obj)? {
        NativeValue::Graph(graph) => Ok(printer::write_graph_summary(scope.out(), graph, layout)?),
        _ => Err(RenderError::Failed("expected a graph".to_string())),
    }
}

fn render_raster(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    match payload(obj)? {
        NativeValue::Raster(raster) => Ok(printer::write_raster_summary(scope.out(), raster)?),
        _ => Err(RenderError::Failed("expected a raster".to_string())),
    }
}

fn render_summary(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    match payload(obj)? {
        NativeValue::Generic(summary) => Ok(summary.write_to(scope.out())?),
        _ => Err(RenderError::Failed("expected an object summary".to_string())),
    }
}

fn render_empty(obj: &DisplayObject, scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    match obj.as_conversion() {
        Some(result) => Ok(printer::write_empty_result(scope.out(), result)?),
        None => Err(RenderError::Failed("expected a conversion result".to_string())),
    }
}

/// Make a foreign window visible; the window shows itself
fn render_gui_window(obj: &DisplayObject, _scope: &mut RenderScope<'_>) -> Result<(), RenderError> {
    let handle = obj
        .as_foreign()
        .ok_or_else(|| RenderError::Failed("expected a foreign window".to_string()))?;
    require_capability(handle.as_ref(), GUI_SET_VISIBLE)
        .and_then(|cap| cap.call(&[ForeignValue::Bool(true)]))
        .map_err(|e| RenderError::Failed(e.to_string()))?;
    debug!("Made {} visible", handle.type_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_native_and_derived_tags() {
        let registry = HandlerRegistry::with_defaults();
        for tag in [
            TypeTag::NativeTable,
            TypeTag::TableDerived,
            TypeTag::ChartDerived,
            TypeTag::GraphDerived,
            TypeTag::RasterDerived,
            TypeTag::SummaryDerived,
            TypeTag::EmptyResult,
            TypeTag::GuiWindow,
        ] {
            assert!(registry.contains(tag), "missing handler for {}", tag);
        }
        assert!(!registry.contains(TypeTag::Unknown));
    }

    #[test]
    fn test_register_replaces_previous_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register(TypeTag::Unknown, |_, _| Err(RenderError::Failed("first".into())));
        registry.register(TypeTag::Unknown, |_, _| Ok(()));
        assert_eq!(registry.len(), 1);
    }
}
