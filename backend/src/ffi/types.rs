//! Type conversion utilities for the FFI boundary
//!
//! Converts between Python objects, [`ForeignValue`]s, JSON values and the
//! option dictionaries accepted by `DisplayEngine`.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString, PyTuple};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use super::handle::PyHandle;
use crate::bridge::ForeignValue;
use crate::config::ChartFormat;
use crate::converters::ConvertOptions;
use crate::panels::PanelLayout;
use crate::result::{ConversionResult, NativeValue};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract an optional field from a Python dict
///
/// # Errors
/// Returns error only if type conversion fails (not if field is missing)
fn extract_optional<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    T: for<'py> FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

fn value_error(message: String) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(message)
}

// ========================================================================
// Python ⇄ ForeignValue
// ========================================================================

/// Convert a Python object into a bridge value; anything that is not a
/// primitive or a list stays a handle
pub fn py_to_foreign(value: &Bound<'_, PyAny>) -> ForeignValue {
    if value.is_none() {
        return ForeignValue::Null;
    }
    // bool before int: Python bools are ints
    if let Ok(b) = value.downcast::<PyBool>() {
        return ForeignValue::Bool(b.is_true());
    }
    if value.is_instance_of::<PyFloat>() {
        if let Ok(f) = value.extract::<f64>() {
            return ForeignValue::Float(f);
        }
    }
    if let Ok(i) = value.extract::<i64>() {
        return ForeignValue::Int(i);
    }
    if value.is_instance_of::<PyString>() {
        if let Ok(s) = value.extract::<String>() {
            return ForeignValue::Str(s);
        }
    }
    if let Ok(list) = value.downcast::<PyList>() {
        return ForeignValue::List(list.iter().map(|item| py_to_foreign(&item)).collect());
    }
    if let Ok(tuple) = value.downcast::<PyTuple>() {
        return ForeignValue::List(tuple.iter().map(|item| py_to_foreign(&item)).collect());
    }
    ForeignValue::Object(Rc::new(PyHandle::new(value.clone().unbind())))
}

/// Convert a bridge value back into a Python object
pub fn foreign_to_py(py: Python<'_>, value: &ForeignValue) -> PyObject {
    match value {
        ForeignValue::Null => py.None(),
        ForeignValue::Bool(b) => b.into_py(py),
        ForeignValue::Int(i) => i.into_py(py),
        ForeignValue::Float(f) => f.into_py(py),
        ForeignValue::Str(s) => s.into_py(py),
        ForeignValue::List(items) => {
            let converted: Vec<PyObject> = items.iter().map(|item| foreign_to_py(py, item)).collect();
            PyList::new_bound(py, converted).into_py(py)
        }
        ForeignValue::Object(obj) => match obj.as_any().downcast_ref::<PyHandle>() {
            Some(handle) => handle.object().clone_ref(py),
            None => obj.describe().into_py(py),
        },
    }
}

// ========================================================================
// JSON → Python
// ========================================================================

pub fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.into_py(py),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.into_py(py),
            (None, Some(f)) => f.into_py(py),
            (None, None) => n.to_string().into_py(py),
        },
        Value::String(s) => s.into_py(py),
        Value::Array(items) => {
            let converted = items.iter().map(|item| json_to_py(py, item)).collect::<PyResult<Vec<_>>>()?;
            PyList::new_bound(py, converted).into_py(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_py(py)
        }
    })
}

/// Python dict → option map readable through `ConfigLookup`
pub fn dict_to_options(dict: &Bound<'_, PyDict>) -> PyResult<HashMap<String, Value>> {
    let mut options = HashMap::new();
    for (key, value) in dict.iter() {
        let key: String = key.extract()?;
        options.insert(key, py_to_foreign(&value).to_json());
    }
    Ok(options)
}

// ========================================================================
// Options and results
// ========================================================================

/// Convert a Python dict to [`ConvertOptions`]; missing keys keep defaults
///
/// # Errors
///
/// Returns PyValueError for an unknown format or panel layout.
pub fn parse_convert_options(py_options: Option<&Bound<'_, PyDict>>) -> PyResult<ConvertOptions> {
    let mut options = ConvertOptions::default();
    let Some(dict) = py_options else {
        return Ok(options);
    };

    if let Some(format) = extract_optional::<String>(dict, "format")? {
        options.format = Some(
            serde_json::from_value::<ChartFormat>(Value::String(format.clone()))
                .map_err(|_| value_error(format!("Unknown chart format '{}'", format)))?,
        );
    }
    if let Some(scale) = extract_optional::<f64>(dict, "scale")? {
        options.scale = scale;
    }
    options.max_panels = extract_optional::<usize>(dict, "max_panels")?;
    if let Some(layout) = dict.get_item("panel_layout")? {
        options.panel_layout = parse_panel_layout(&layout)?;
    }
    if let Some(include) = extract_optional::<bool>(dict, "include_metadata")? {
        options.include_metadata = include;
    }
    options.node_attributes = extract_optional::<Vec<String>>(dict, "node_attributes")?
        .map(|names| names.into_iter().collect::<BTreeSet<_>>());
    options.edge_attributes = extract_optional::<Vec<String>>(dict, "edge_attributes")?
        .map(|names| names.into_iter().collect::<BTreeSet<_>>());
    if let Some(remove) = extract_optional::<bool>(dict, "remove_self_loops")? {
        options.remove_self_loops = remove;
    }
    Ok(options)
}

/// `"auto" | "horizontal" | "vertical" | (rows, cols)`
fn parse_panel_layout(value: &Bound<'_, PyAny>) -> PyResult<PanelLayout> {
    if let Ok((rows, cols)) = value.extract::<(usize, usize)>() {
        return Ok(PanelLayout::Grid { rows, cols });
    }
    let name: String = value.extract()?;
    match name.as_str() {
        "auto" => Ok(PanelLayout::Auto),
        "horizontal" => Ok(PanelLayout::Horizontal),
        "vertical" => Ok(PanelLayout::Vertical),
        other => Err(value_error(format!("Unknown panel layout '{}'", other))),
    }
}

/// Serialize a native value as its `{"type", "value"}` JSON form
pub fn native_value_to_py(py: Python<'_>, value: &NativeValue) -> PyResult<PyObject> {
    let json = serde_json::to_value(value).map_err(|e| value_error(e.to_string()))?;
    json_to_py(py, &json)
}

/// Convert a [`ConversionResult`] to a Python dict
///
/// Keys: `kind`, `success`, `source_type`, `payload`, `metadata`, `error`.
pub fn conversion_result_to_py(py: Python<'_>, result: &ConversionResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    let kind = serde_json::to_value(result.kind()).unwrap_or(Value::Null);
    dict.set_item("kind", json_to_py(py, &kind)?)?;
    dict.set_item("success", result.is_success())?;
    dict.set_item("source_type", result.source_type())?;

    let payload = match result.payload() {
        Some(payload) => native_value_to_py(py, payload)?,
        None => py.None(),
    };
    dict.set_item("payload", payload)?;

    let metadata = Value::Object(result.metadata().clone().into_iter().collect());
    dict.set_item("metadata", json_to_py(py, &metadata)?)?;
    dict.set_item("error", result.error().map(|e| e.to_string()))?;
    Ok(dict.unbind())
}
