//! DisplayDispatcher and the display handler registry
//!
//! `display` classifies a value, converts it when it is a foreign handle,
//! and hands the result to the render function registered for its tag.
//! Every call produces some observable output: when conversion or rendering
//! fails the generic introspective printer runs instead.
//!
//! # State Machine
//!
//! ```text
//! Idle → Classifying ─┬→ Converting ─┬→ Rendering ─┬→ Done
//!                     │              └→ Failed     └→ Failed
//!                     └→ Rendering
//! ```

use crate::probe::TypeTag;
use thiserror::Error;

pub mod dispatcher;
pub mod handlers;
pub mod printer;
pub mod viewer;

pub use dispatcher::{DispatchState, DisplayContext, DisplayDispatcher, DisplayOutcome, RenderScope};
pub use handlers::{HandlerRegistry, RenderFn};
pub use viewer::TableViewer;

/// Display handler failures
///
/// These never escape `display`; they route the call to the generic printer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No display handler registered for '{0}'")]
    NoHandler(TypeTag),

    #[error("Render failed: {0}")]
    Failed(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
