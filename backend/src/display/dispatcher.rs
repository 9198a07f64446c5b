//! DisplayDispatcher
//!
//! # Critical Invariants
//!
//! - Every call starts in `Idle` and ends in `Done` or `Failed`
//! - `Failed` always runs the generic printer; `display` never panics or
//!   returns an error for a classified value
//! - A handle already being displayed further up the same call is not
//!   displayed again (the recursion guard short-circuits it)

use super::handlers::HandlerRegistry;
use super::printer;
use super::viewer::TableViewer;
use super::RenderError;
use crate::bridge::ForeignObject;
use crate::config::DisplayConfig;
use crate::converters::{convert_generic, ConvertOptions, ConverterInfo, ConverterRegistry};
use crate::object::DisplayObject;
use crate::panels::PanelAssembler;
use crate::probe::{classify, TypeTag};
use crate::result::{ConversionResult, NativeValue};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatcher states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DispatchState {
    Idle,
    Classifying,
    Converting,
    Rendering,
    Done,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Done | DispatchState::Failed)
    }

    /// Allowed edges of the state machine
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (*self, next),
            (Idle, Classifying)
                | (Classifying, Converting)
                | (Classifying, Rendering)
                | (Classifying, Failed)
                | (Converting, Rendering)
                | (Converting, Failed)
                | (Rendering, Done)
                | (Rendering, Failed)
        )
    }
}

/// Result of one `display` call
#[derive(Debug, Clone)]
pub struct DisplayOutcome {
    value: DisplayObject,
    tag: TypeTag,
    transitions: Vec<DispatchState>,
    reentered: bool,
}

impl DisplayOutcome {
    fn reentered(value: DisplayObject) -> Self {
        Self {
            value,
            tag: TypeTag::Unknown,
            transitions: vec![DispatchState::Idle],
            reentered: true,
        }
    }

    /// The displayed value: the conversion result for converted handles,
    /// otherwise the object that was passed in
    pub fn value(&self) -> &DisplayObject {
        &self.value
    }

    pub fn into_value(self) -> DisplayObject {
        self.value
    }

    /// Tag the render step was resolved against
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Every state visited, in order, starting with `Idle`
    pub fn transitions(&self) -> &[DispatchState] {
        &self.transitions
    }

    pub fn state(&self) -> DispatchState {
        self.transitions.last().copied().unwrap_or(DispatchState::Idle)
    }

    pub fn is_done(&self) -> bool {
        self.state() == DispatchState::Done
    }

    pub fn is_failed(&self) -> bool {
        self.state() == DispatchState::Failed
    }

    /// Short-circuited by the recursion guard
    pub fn is_reentry(&self) -> bool {
        self.reentered
    }
}

/// Per-call scratch state shared with nested `redisplay` calls
#[derive(Debug, Default)]
pub struct DisplayContext {
    active: HashSet<u64>,
}

impl DisplayContext {
    /// Mark `identity` active; false when it already was
    fn enter(&mut self, identity: u64) -> bool {
        self.active.insert(identity)
    }

    fn leave(&mut self, identity: u64) {
        self.active.remove(&identity);
    }

    pub fn is_active(&self, identity: u64) -> bool {
        self.active.contains(&identity)
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }
}

/// What a render function can reach while it runs
pub struct RenderScope<'a> {
    dispatcher: &'a DisplayDispatcher,
    ctx: &'a mut DisplayContext,
    out: &'a mut dyn Write,
    options: &'a ConvertOptions,
}

impl<'a> RenderScope<'a> {
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.dispatcher.config
    }

    pub fn options(&self) -> &ConvertOptions {
        self.options
    }

    pub fn table_viewer(&self) -> Option<Arc<dyn TableViewer>> {
        self.dispatcher.table_viewer.clone()
    }

    pub fn context(&self) -> &DisplayContext {
        &*self.ctx
    }

    /// Display another value within the current call
    pub fn redisplay(&mut self, obj: DisplayObject) -> DisplayOutcome {
        self.dispatcher.dispatch(obj, self.options, &mut *self.ctx, &mut *self.out)
    }
}

struct Trace {
    states: Vec<DispatchState>,
}

impl Trace {
    fn new() -> Self {
        Self {
            states: vec![DispatchState::Idle],
        }
    }

    fn enter(&mut self, next: DispatchState) {
        let current = self.states.last().copied().unwrap_or(DispatchState::Idle);
        debug_assert!(current.can_transition_to(next), "{:?} -> {:?}", current, next);
        debug!("Display {:?} -> {:?}", current, next);
        self.states.push(next);
    }

    fn finish(self, value: DisplayObject, tag: TypeTag) -> DisplayOutcome {
        DisplayOutcome {
            value,
            tag,
            transitions: self.states,
            reentered: false,
        }
    }
}

/// Classifies, converts and renders displayable values
pub struct DisplayDispatcher {
    converters: ConverterRegistry,
    handlers: HandlerRegistry,
    config: DisplayConfig,
    table_viewer: Option<Arc<dyn TableViewer>>,
}

impl DisplayDispatcher {
    /// Dispatcher with the default converters and display handlers
    pub fn new(config: DisplayConfig) -> Self {
        Self::with_registry(ConverterRegistry::with_defaults(), config)
    }

    pub fn with_registry(converters: ConverterRegistry, config: DisplayConfig) -> Self {
        Self {
            converters,
            handlers: HandlerRegistry::with_defaults(),
            config,
            table_viewer: None,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn set_table_viewer(&mut self, viewer: Arc<dyn TableViewer>) {
        self.table_viewer = Some(viewer);
    }

    /// Register a render function for `tag`; the last registration wins
    pub fn register_display_handler<F>(&mut self, tag: TypeTag, handler: F)
    where
        F: Fn(&DisplayObject, &mut RenderScope<'_>) -> Result<(), RenderError> + 'static,
    {
        self.handlers.register(tag, handler);
    }

    pub fn list_converters(&self) -> Vec<ConverterInfo> {
        self.converters.list()
    }

    pub fn classify(&self, obj: &DisplayObject) -> TypeTag {
        classify(obj)
    }

    /// Convert with the best registered converter, or generically when none
    /// accepts the handle
    pub fn convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions) -> ConversionResult {
        match self.converters.find(handle) {
            Some(converter) => converter.convert(handle, options, &self.config),
            None => convert_generic(handle),
        }
    }

    /// Display on stdout
    pub fn display(&self, obj: impl Into<DisplayObject>, options: &ConvertOptions) -> DisplayOutcome {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let outcome = self.display_to(obj, options, &mut lock);
        if let Err(e) = lock.flush() {
            warn!("Failed to flush display output: {}", e);
        }
        outcome
    }

    /// Display into `out`
    pub fn display_to(&self, obj: impl Into<DisplayObject>, options: &ConvertOptions, out: &mut dyn Write) -> DisplayOutcome {
        let mut ctx = DisplayContext::default();
        self.dispatch(obj.into(), options, &mut ctx, out)
    }

    fn dispatch(
        &self,
        obj: DisplayObject,
        options: &ConvertOptions,
        ctx: &mut DisplayContext,
        out: &mut dyn Write,
    ) -> DisplayOutcome {
        let identity = obj.identity();
        if let Some(id) = identity {
            if !ctx.enter(id) {
                debug!("{} is already being displayed; skipping", obj.type_label());
                return DisplayOutcome::reentered(obj);
            }
        }

        let outcome = self.run(obj, options, ctx, out);

        if let Some(id) = identity {
            ctx.leave(id);
        }
        outcome
    }

    fn run(&self, obj: DisplayObject, options: &ConvertOptions, ctx: &mut DisplayContext, out: &mut dyn Write) -> DisplayOutcome {
        let mut trace = Trace::new();
        trace.enter(DispatchState::Classifying);
        let tag = classify(&obj);
        debug!("Classified {} as {}", obj.type_label(), tag);

        let obj = match obj {
            DisplayObject::Sequence(items) => return self.display_batch(items, options, ctx, out, trace),
            other => other,
        };

        let handle = obj.as_foreign().filter(|_| tag.is_foreign_pattern()).cloned();
        let (subject, tag) = match handle {
            Some(handle) => {
                trace.enter(DispatchState::Converting);
                match self.converters.find(handle.as_ref()) {
                    Some(converter) => {
                        let result = converter.convert(handle.as_ref(), options, &self.config);
                        if let Some(error) = result.error() {
                            warn!("Converting {} failed: {}", handle.type_name(), error);
                            trace.enter(DispatchState::Failed);
                            let subject = DisplayObject::Converted(result);
                            self.fallback(&subject, out);
                            return trace.finish(subject, tag);
                        }
                        info!("Converted {} with '{}'", handle.type_name(), converter.name());
                        let subject = DisplayObject::Converted(result);
                        let derived = classify(&subject);
                        (subject, derived)
                    }
                    None => {
                        debug!("No converter accepts {}", handle.type_name());
                        (obj, tag)
                    }
                }
            }
            None => (obj, tag),
        };

        trace.enter(DispatchState::Rendering);
        self.render(subject, tag, options, ctx, out, trace)
    }

    /// Convert every element, drop failures, and compose the rest into one figure
    fn display_batch(
        &self,
        items: Vec<DisplayObject>,
        options: &ConvertOptions,
        ctx: &mut DisplayContext,
        out: &mut dyn Write,
        mut trace: Trace,
    ) -> DisplayOutcome {
        trace.enter(DispatchState::Converting);
        let values: Vec<NativeValue> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let value = self.batch_value(item, options);
                if value.is_none() {
                    debug!("Dropping batch element {} ({})", index, item.type_label());
                }
                value
            })
            .collect();

        if values.is_empty() {
            return match items.into_iter().next() {
                Some(first) => {
                    debug!("No batch element converted; displaying the first one alone");
                    self.dispatch(first, options, ctx, out)
                }
                None => {
                    trace.enter(DispatchState::Failed);
                    let subject = DisplayObject::Sequence(Vec::new());
                    self.fallback(&subject, out);
                    trace.finish(subject, TypeTag::Collection)
                }
            };
        }

        info!("Composing {} of {} batch elements", values.len(), items.len());
        let assembler = PanelAssembler::new(options.resolved_max_panels(&self.config), options.panel_layout);
        let figure = assembler.compose(values, self.config.figure_size, None);
        let subject = DisplayObject::Native(NativeValue::Figure(figure));

        trace.enter(DispatchState::Rendering);
        self.render(subject, TypeTag::NativeFigure, options, ctx, out, trace)
    }

    fn batch_value(&self, item: &DisplayObject, options: &ConvertOptions) -> Option<NativeValue> {
        match item {
            DisplayObject::Native(value) => Some(value.clone()),
            DisplayObject::Converted(result) => result.payload().cloned(),
            DisplayObject::Foreign(handle) => {
                let converter = self.converters.find(handle.as_ref())?;
                converter.convert(handle.as_ref(), options, &self.config).into_payload()
            }
            DisplayObject::Sequence(_) => None,
        }
    }

    fn render(
        &self,
        subject: DisplayObject,
        tag: TypeTag,
        options: &ConvertOptions,
        ctx: &mut DisplayContext,
        out: &mut dyn Write,
        mut trace: Trace,
    ) -> DisplayOutcome {
        let outcome = match self.handlers.get(tag) {
            Some(handler) => {
                let mut scope = RenderScope {
                    dispatcher: self,
                    ctx: &mut *ctx,
                    out: &mut *out,
                    options,
                };
                handler(&subject, &mut scope)
            }
            None => Err(RenderError::NoHandler(tag)),
        };

        match outcome {
            Ok(()) => trace.enter(DispatchState::Done),
            Err(e) => {
                warn!("Rendering {} failed: {}; using generic display", subject.type_label(), e);
                trace.enter(DispatchState::Failed);
                self.fallback(&subject, out);
            }
        }
        trace.finish(subject, tag)
    }

    /// Generic introspective printer; output errors are logged, never raised
    fn fallback(&self, obj: &DisplayObject, out: &mut dyn Write) {
        if let Err(e) = printer::write_generic(out, obj) {
            warn!("Generic display of {} failed: {}", obj.type_label(), e);
        }
    }
}

impl Default for DisplayDispatcher {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ForeignValue, ScriptedObject};
    use crate::native::{CellValue, Column, TabularFrame};
    use std::cell::Cell;
    use std::rc::Rc;

    fn frame() -> NativeValue {
        NativeValue::Table(TabularFrame::new(vec![Column::new("a", vec![CellValue::Int(1)])], 1))
    }

    fn window() -> ScriptedObject {
        ScriptedObject::new("ImageWindow").returning("setVisible", ForeignValue::Null)
    }

    #[test]
    fn test_native_value_skips_converting() {
        let dispatcher = DisplayDispatcher::default();
        let mut out = Vec::new();
        let outcome = dispatcher.display_to(frame(), &ConvertOptions::default(), &mut out);

        assert_eq!(
            outcome.transitions(),
            &[
                DispatchState::Idle,
                DispatchState::Classifying,
                DispatchState::Rendering,
                DispatchState::Done
            ]
        );
        assert_eq!(outcome.tag(), TypeTag::NativeTable);
        assert!(String::from_utf8(out).unwrap().contains("[1 rows x 1 columns]"));
    }

    #[test]
    fn test_unknown_handle_fails_to_generic_printer() {
        let dispatcher = DisplayDispatcher::default();
        let handle = ScriptedObject::new("Mystery").attribute("size", ForeignValue::Int(1)).into_ref();
        let mut out = Vec::new();
        let outcome = dispatcher.display_to(handle.clone(), &ConvertOptions::default(), &mut out);

        assert!(outcome.is_failed());
        assert_eq!(outcome.tag(), TypeTag::Unknown);
        assert!(outcome.value().same_as(&DisplayObject::Foreign(handle)));
        assert!(String::from_utf8(out).unwrap().contains("Mystery"));
    }

    #[test]
    fn test_gui_window_made_visible() {
        let shown = Rc::new(Cell::new(false));
        let flag = shown.clone();
        let handle = ScriptedObject::new("ImageWindow")
            .method("setVisible", move |args| {
                flag.set(args.first().and_then(ForeignValue::as_bool).unwrap_or(false));
                Ok(ForeignValue::Null)
            })
            .into_ref();

        let outcome = DisplayDispatcher::default().display_to(handle, &ConvertOptions::default(), &mut io::sink());
        assert!(outcome.is_done());
        assert_eq!(outcome.tag(), TypeTag::GuiWindow);
        assert!(shown.get());
    }

    #[test]
    fn test_recursion_guard_short_circuits_same_identity() {
        let reentered = Rc::new(Cell::new(false));
        let seen = reentered.clone();
        let mut dispatcher = DisplayDispatcher::default();
        dispatcher.register_display_handler(TypeTag::GuiWindow, move |obj, scope| {
            let nested = scope.redisplay(obj.clone());
            seen.set(nested.is_reentry());
            Ok(())
        });

        let outcome = dispatcher.display_to(window().into_ref(), &ConvertOptions::default(), &mut io::sink());
        assert!(outcome.is_done());
        assert!(reentered.get());
    }

    #[test]
    fn test_failing_handler_falls_back() {
        let mut dispatcher = DisplayDispatcher::default();
        dispatcher.register_display_handler(TypeTag::NativeTable, |_, _| Err(RenderError::Failed("boom".into())));
        let mut out = Vec::new();
        let outcome = dispatcher.display_to(frame(), &ConvertOptions::default(), &mut out);

        assert!(outcome.is_failed());
        assert!(!out.is_empty());
    }

    #[test]
    fn test_empty_sequence_fails_without_panicking() {
        let outcome = DisplayDispatcher::default().display_to(
            DisplayObject::Sequence(Vec::new()),
            &ConvertOptions::default(),
            &mut io::sink(),
        );
        assert!(outcome.is_failed());
        assert_eq!(outcome.tag(), TypeTag::Collection);
    }

    #[test]
    fn test_state_edges() {
        assert!(DispatchState::Idle.can_transition_to(DispatchState::Classifying));
        assert!(!DispatchState::Idle.can_transition_to(DispatchState::Done));
        assert!(DispatchState::Failed.is_terminal());
    }
}
