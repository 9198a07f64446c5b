//! Python bindings (`pyo3` feature)
//!
//! - **handle**: [`PyHandle`](handle::PyHandle), a [`ForeignObject`](crate::bridge::ForeignObject)
//!   over a Python-side proxy
//! - **engine**: the `DisplayEngine` class exported to Python
//! - **types**: conversions between Python objects, bridge values and JSON

pub mod engine;
pub mod handle;
pub mod types;
