//! Python proxy objects as foreign handles
//!
//! The bridge runtime (JPype, Py4J or similar) hands Python proxies to the
//! host. A [`PyHandle`] probes them with `hasattr` and invokes them with
//! `getattr` + call, so capability checks never raise.

use pyo3::prelude::*;
use pyo3::types::PyTuple;
use std::any::Any;

use super::types::{foreign_to_py, py_to_foreign};
use crate::bridge::{BridgeError, ForeignObject, ForeignValue, Member};

/// Foreign handle backed by a Python object
pub struct PyHandle {
    obj: Py<PyAny>,
}

impl PyHandle {
    pub fn new(obj: Py<PyAny>) -> Self {
        Self { obj }
    }

    pub fn object(&self) -> &Py<PyAny> {
        &self.obj
    }
}

fn call_failed(name: &str, err: PyErr) -> BridgeError {
    BridgeError::CallFailed {
        name: name.to_string(),
        message: err.to_string(),
    }
}

impl ForeignObject for PyHandle {
    fn type_name(&self) -> String {
        Python::with_gil(|py| {
            self.obj
                .bind(py)
                .get_type()
                .getattr("__name__")
                .and_then(|name| name.extract::<String>())
                .unwrap_or_else(|_| "object".to_string())
        })
    }

    fn identity(&self) -> u64 {
        self.obj.as_ptr() as usize as u64
    }

    fn has_capability(&self, name: &str) -> bool {
        Python::with_gil(|py| self.obj.bind(py).hasattr(name).unwrap_or(false))
    }

    /// Callable members are called with `args`; plain attributes are read
    /// and only accept an empty argument list
    fn invoke(&self, name: &str, args: &[ForeignValue]) -> Result<ForeignValue, BridgeError> {
        Python::with_gil(|py| {
            let bound = self.obj.bind(py);
            if !bound.hasattr(name).map_err(|e| call_failed(name, e))? {
                return Err(BridgeError::MissingCapability(name.to_string()));
            }
            let attr = bound.getattr(name).map_err(|e| call_failed(name, e))?;

            let value = if attr.is_callable() {
                let py_args: Vec<PyObject> = args.iter().map(|arg| foreign_to_py(py, arg)).collect();
                attr.call1(PyTuple::new_bound(py, py_args))
                    .map_err(|e| call_failed(name, e))?
            } else if args.is_empty() {
                attr
            } else {
                return Err(BridgeError::CallFailed {
                    name: name.to_string(),
                    message: "attribute is not callable".to_string(),
                });
            };
            Ok(py_to_foreign(&value))
        })
    }

    fn foreign_eq(&self, other: &dyn ForeignObject) -> bool {
        let Some(other) = other.as_any().downcast_ref::<PyHandle>() else {
            return false;
        };
        Python::with_gil(|py| self.obj.bind(py).eq(other.obj.bind(py)).unwrap_or(false))
    }

    fn foreign_hash(&self) -> u64 {
        Python::with_gil(|py| match self.obj.bind(py).hash() {
            Ok(hash) => hash as u64,
            Err(_) => self.identity(),
        })
    }

    fn members(&self) -> Vec<Member> {
        Python::with_gil(|py| {
            let bound = self.obj.bind(py);
            let names: Vec<String> = py
                .import_bound("builtins")
                .and_then(|builtins| builtins.call_method1("dir", (bound.clone(),)))
                .and_then(|listing| listing.extract())
                .unwrap_or_default();

            names
                .into_iter()
                .map(|name| {
                    let callable = bound.getattr(name.as_str()).map(|a| a.is_callable()).unwrap_or(false);
                    if callable {
                        Member::method(name)
                    } else {
                        Member::attribute(name)
                    }
                })
                .collect()
        })
    }

    fn describe(&self) -> String {
        Python::with_gil(|py| {
            self.obj
                .bind(py)
                .str()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("<{}>", self.type_name()))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
