//! PyO3 wrapper for the DisplayDispatcher

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::rc::Rc;

use super::handle::PyHandle;
use super::types::{
    conversion_result_to_py, dict_to_options, native_value_to_py, parse_convert_options, py_to_foreign,
};
use crate::bridge::ForeignValue;
use crate::config::DisplayConfig;
use crate::display::DisplayDispatcher;
use crate::native::ObjectSummary;
use crate::object::DisplayObject;
use crate::probe::classify;
use crate::result::NativeValue;

/// Python wrapper for [`DisplayDispatcher`]
///
/// # Example (from Python)
///
/// ```python
/// from foreign_display_core_rs import DisplayEngine
///
/// engine = DisplayEngine({"chart_format": "png", "max_panels": 12})
/// result = engine.convert(table)
/// print(result["metadata"]["row_count"])
/// engine.display([chart_a, chart_b], {"panel_layout": "horizontal"})
/// ```
#[pyclass(name = "DisplayEngine", unsendable)]
pub struct PyDisplayEngine {
    inner: DisplayDispatcher,
}

#[pymethods]
impl PyDisplayEngine {
    /// Create an engine from an option dictionary
    ///
    /// # Errors
    ///
    /// Raises ValueError if an option has the wrong type or range.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => DisplayConfig::from_lookup(&dict_to_options(dict)?)
                .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?,
            None => DisplayConfig::default(),
        };
        Ok(PyDisplayEngine {
            inner: DisplayDispatcher::new(config),
        })
    }

    /// Resolved type tag of `obj`, e.g. `"table"` or `"unknown"`
    fn classify(&self, obj: &Bound<'_, PyAny>) -> String {
        classify(&to_display_object(obj)).as_str().to_string()
    }

    /// Registered converters as dicts with `name`, `predicate_name`,
    /// `converter_name` and `priority`
    fn list_converters(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for info in self.inner.list_converters() {
            let dict = PyDict::new_bound(py);
            dict.set_item("name", info.name)?;
            dict.set_item("predicate_name", info.predicate_name)?;
            dict.set_item("converter_name", info.converter_name)?;
            dict.set_item("priority", info.priority)?;
            list.append(dict)?;
        }
        Ok(list.unbind())
    }

    /// Convert a foreign object; failures are reported in the result dict
    #[pyo3(signature = (obj, options=None))]
    fn convert(&self, py: Python, obj: &Bound<'_, PyAny>, options: Option<&Bound<'_, PyDict>>) -> PyResult<Py<PyDict>> {
        let options = parse_convert_options(options)?;
        let handle = PyHandle::new(obj.clone().unbind());
        let result = self.inner.convert(&handle, &options);
        conversion_result_to_py(py, &result)
    }

    /// Display `obj` on stdout
    ///
    /// Returns the conversion result dict when a converter ran, the composite
    /// figure for a list, otherwise `obj` unchanged.
    #[pyo3(signature = (obj, options=None))]
    fn display(&self, py: Python, obj: &Bound<'_, PyAny>, options: Option<&Bound<'_, PyDict>>) -> PyResult<PyObject> {
        let options = parse_convert_options(options)?;
        let outcome = self.inner.display(to_display_object(obj), &options);
        match outcome.value() {
            DisplayObject::Converted(result) => Ok(conversion_result_to_py(py, result)?.into_py(py)),
            DisplayObject::Native(value) => native_value_to_py(py, value),
            _ => Ok(obj.clone().unbind()),
        }
    }
}

/// Lists and tuples become sequences; everything else is a single handle
fn to_display_object(obj: &Bound<'_, PyAny>) -> DisplayObject {
    match py_to_foreign(obj) {
        ForeignValue::List(items) => DisplayObject::Sequence(items.into_iter().map(value_to_display).collect()),
        _ => DisplayObject::Foreign(Rc::new(PyHandle::new(obj.clone().unbind()))),
    }
}

/// Primitive list elements are shown as their textual preview
fn value_to_display(value: ForeignValue) -> DisplayObject {
    match value {
        ForeignValue::Object(handle) => DisplayObject::Foreign(handle),
        other => DisplayObject::Native(NativeValue::Generic(ObjectSummary {
            type_name: other.variant_name().to_string(),
            attributes: Vec::new(),
            methods: Vec::new(),
            preview: other.to_string(),
        })),
    }
}
