//! GUI table viewer
//!
//! The viewer itself belongs to the embedding application. The dispatcher
//! only launches it, on a detached worker thread, and never waits for it.

use super::RenderError;
use crate::native::TabularFrame;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Thread name of the detached viewer worker
pub const VIEWER_THREAD_NAME: &str = "table-viewer";

/// Opens a table in a GUI window
pub trait TableViewer: Send + Sync {
    fn show(&self, frame: TabularFrame, title: Option<String>);
}

/// Fire-and-forget launch; the worker's handle is dropped immediately
pub fn launch(viewer: Arc<dyn TableViewer>, frame: TabularFrame, title: Option<String>) -> Result<(), RenderError> {
    let (rows, cols) = frame.shape();
    thread::Builder::new()
        .name(VIEWER_THREAD_NAME.to_string())
        .spawn(move || viewer.show(frame, title))?;
    debug!("Launched table viewer for {}x{} frame", rows, cols);
    Ok(())
}
