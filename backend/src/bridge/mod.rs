//! Bridge Capability Surface
//!
//! Everything this crate knows about a foreign object comes through the
//! [`ForeignObject`] trait: a boolean capability query and a value-returning
//! invocation. There is no static type tag; callers probe first and use the
//! capability only when it is present.
//!
//! # Probe Primitive
//!
//! [`try_get_capability`] is the single reusable "probe, then use if present"
//! step. It returns a [`Capability`] bound to its handle:
//!
//! ```rust
//! use foreign_display_core_rs::bridge::{try_get_capability, ForeignValue, ScriptedObject};
//!
//! let table = ScriptedObject::new("DefaultGenericTable")
//!     .returning("getRowCount", ForeignValue::Int(3))
//!     .into_ref();
//!
//! let rows = try_get_capability(table.as_ref(), "getRowCount")
//!     .map(|cap| cap.call_usize())
//!     .transpose()
//!     .unwrap();
//! assert_eq!(rows, Some(3));
//! assert!(try_get_capability(table.as_ref(), "vertexSet").is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

pub mod scripted;

pub use scripted::ScriptedObject;

/// Shared reference to a foreign object
///
/// Handles are borrowed from the foreign runtime for the duration of a call;
/// nothing in this crate keeps one past the operation that received it.
pub type ForeignRef = Rc<dyn ForeignObject>;

/// Errors raised while talking to the foreign runtime
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Capability '{0}' is not exposed by the foreign object")]
    MissingCapability(String),

    #[error("Foreign call '{name}' raised: {message}")]
    CallFailed { name: String, message: String },

    #[error("Foreign call '{name}' returned {found}, expected {expected}")]
    UnexpectedValue {
        name: String,
        expected: &'static str,
        found: String,
    },
}

/// A member discovered by introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub callable: bool,
}

impl Member {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            callable: false,
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            callable: true,
        }
    }

    /// Public members are those not prefixed with an underscore
    pub fn is_public(&self) -> bool {
        !self.name.starts_with('_')
    }
}

/// Object living in the foreign runtime
///
/// Implementations wrap whatever the bridge hands out (a Python proxy, a JNI
/// reference, a scripted test double). Every method must be side-effect free
/// except [`ForeignObject::invoke`].
pub trait ForeignObject {
    /// Bridge-reported type name. Only a naming hint, never a reliable type tag.
    fn type_name(&self) -> String;

    /// Host-side identity of the handle (stable for the handle's lifetime)
    fn identity(&self) -> u64;

    /// Does the handle expose an operation or attribute called `name`?
    fn has_capability(&self, name: &str) -> bool;

    /// Invoke the operation `name` (or read the attribute `name` when `args` is empty)
    fn invoke(&self, name: &str, args: &[ForeignValue]) -> Result<ForeignValue, BridgeError>;

    /// Equality as the foreign runtime defines it
    fn foreign_eq(&self, other: &dyn ForeignObject) -> bool {
        self.identity() == other.identity()
    }

    /// Hash consistent with [`ForeignObject::foreign_eq`]
    fn foreign_hash(&self) -> u64 {
        self.identity()
    }

    /// Public attributes and callable members, for introspective printing
    fn members(&self) -> Vec<Member> {
        Vec::new()
    }

    /// Short textual preview (the foreign `toString`)
    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }

    fn as_any(&self) -> &dyn Any;
}

/// Value crossing the bridge
#[derive(Clone)]
pub enum ForeignValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ForeignValue>),
    Object(ForeignRef),
}

impl ForeignValue {
    /// Name of the variant, used in error messages
    pub fn variant_name(&self) -> &'static str {
        match self {
            ForeignValue::Null => "null",
            ForeignValue::Bool(_) => "bool",
            ForeignValue::Int(_) => "int",
            ForeignValue::Float(_) => "float",
            ForeignValue::Str(_) => "string",
            ForeignValue::List(_) => "list",
            ForeignValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ForeignValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ForeignValue::Bool(b) => Some(*b),
            ForeignValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ForeignValue::Int(i) => Some(*i),
            ForeignValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ForeignValue::Int(i) => Some(*i as f64),
            ForeignValue::Float(f) => Some(*f),
            ForeignValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ForeignValue]> {
        match self {
            ForeignValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ForeignRef> {
        match self {
            ForeignValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Equality on the foreign side: objects compare with `foreign_eq`,
    /// primitives structurally.
    pub fn foreign_eq(&self, other: &ForeignValue) -> bool {
        match (self, other) {
            (ForeignValue::Object(a), ForeignValue::Object(b)) => a.foreign_eq(b.as_ref()),
            (ForeignValue::Null, ForeignValue::Null) => true,
            (ForeignValue::Bool(a), ForeignValue::Bool(b)) => a == b,
            (ForeignValue::Int(a), ForeignValue::Int(b)) => a == b,
            (ForeignValue::Float(a), ForeignValue::Float(b)) => a == b,
            (ForeignValue::Str(a), ForeignValue::Str(b)) => a == b,
            (ForeignValue::List(a), ForeignValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.foreign_eq(y))
            }
            _ => false,
        }
    }

    /// Convert into JSON; objects collapse to their textual preview
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ForeignValue::Null => serde_json::Value::Null,
            ForeignValue::Bool(b) => serde_json::Value::Bool(*b),
            ForeignValue::Int(i) => serde_json::Value::from(*i),
            ForeignValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ForeignValue::Str(s) => serde_json::Value::String(s.clone()),
            ForeignValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ForeignValue::to_json).collect())
            }
            ForeignValue::Object(obj) => serde_json::Value::String(obj.describe()),
        }
    }

    /// Flatten nested numeric lists into a single vector (row-major)
    pub fn flatten_numeric(&self, out: &mut Vec<f64>) -> bool {
        match self {
            ForeignValue::List(items) => items.iter().all(|item| item.flatten_numeric(out)),
            other => match other.as_f64() {
                Some(v) => {
                    out.push(v);
                    true
                }
                None => false,
            },
        }
    }
}

impl fmt::Debug for ForeignValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignValue::Null => write!(f, "Null"),
            ForeignValue::Bool(b) => write!(f, "Bool({})", b),
            ForeignValue::Int(i) => write!(f, "Int({})", i),
            ForeignValue::Float(x) => write!(f, "Float({})", x),
            ForeignValue::Str(s) => write!(f, "Str({:?})", s),
            ForeignValue::List(items) => f.debug_list().entries(items).finish(),
            ForeignValue::Object(obj) => write!(f, "Object({})", obj.type_name()),
        }
    }
}

impl fmt::Display for ForeignValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignValue::Null => write!(f, "null"),
            ForeignValue::Bool(b) => write!(f, "{}", b),
            ForeignValue::Int(i) => write!(f, "{}", i),
            ForeignValue::Float(x) => write!(f, "{}", x),
            ForeignValue::Str(s) => write!(f, "{}", s),
            ForeignValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ForeignValue::Object(obj) => write!(f, "{}", obj.describe()),
        }
    }
}

impl From<bool> for ForeignValue {
    fn from(value: bool) -> Self {
        ForeignValue::Bool(value)
    }
}

impl From<i64> for ForeignValue {
    fn from(value: i64) -> Self {
        ForeignValue::Int(value)
    }
}

impl From<f64> for ForeignValue {
    fn from(value: f64) -> Self {
        ForeignValue::Float(value)
    }
}

impl From<&str> for ForeignValue {
    fn from(value: &str) -> Self {
        ForeignValue::Str(value.to_string())
    }
}

impl From<String> for ForeignValue {
    fn from(value: String) -> Self {
        ForeignValue::Str(value)
    }
}

impl From<ForeignRef> for ForeignValue {
    fn from(value: ForeignRef) -> Self {
        ForeignValue::Object(value)
    }
}

/// A capability bound to the handle that exposes it
#[derive(Clone, Copy)]
pub struct Capability<'a> {
    handle: &'a dyn ForeignObject,
    name: &'a str,
}

impl<'a> Capability<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn call(&self, args: &[ForeignValue]) -> Result<ForeignValue, BridgeError> {
        self.handle.invoke(self.name, args)
    }

    pub fn call0(&self) -> Result<ForeignValue, BridgeError> {
        self.call(&[])
    }

    pub fn call_bool(&self) -> Result<bool, BridgeError> {
        let value = self.call0()?;
        value.as_bool().ok_or_else(|| self.unexpected("bool", &value))
    }

    /// Read a non-negative count
    pub fn call_usize(&self) -> Result<usize, BridgeError> {
        let value = self.call0()?;
        match value.as_i64() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(self.unexpected("non-negative int", &value)),
        }
    }

    pub fn call_string(&self) -> Result<String, BridgeError> {
        match self.call0()? {
            ForeignValue::Str(s) => Ok(s),
            ForeignValue::Null => Err(self.unexpected("string", &ForeignValue::Null)),
            other => Ok(other.to_string()),
        }
    }

    pub fn call_list(&self) -> Result<Vec<ForeignValue>, BridgeError> {
        match self.call0()? {
            ForeignValue::List(items) => Ok(items),
            other => Err(self.unexpected("list", &other)),
        }
    }

    fn unexpected(&self, expected: &'static str, found: &ForeignValue) -> BridgeError {
        BridgeError::UnexpectedValue {
            name: self.name.to_string(),
            expected,
            found: found.variant_name().to_string(),
        }
    }
}

impl fmt::Debug for Capability<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({}.{})", self.handle.type_name(), self.name)
    }
}

/// Probe `handle` for `name`; `Some` only when the capability is present
pub fn try_get_capability<'a>(handle: &'a dyn ForeignObject, name: &'a str) -> Option<Capability<'a>> {
    if handle.has_capability(name) {
        Some(Capability { handle, name })
    } else {
        None
    }
}

/// First capability present among `names`, in order
pub fn first_capability<'a>(handle: &'a dyn ForeignObject, names: &[&'a str]) -> Option<Capability<'a>> {
    names.iter().find_map(|name| try_get_capability(handle, name))
}

/// Capability that must be present; absence is reported as an error
pub fn require_capability<'a>(handle: &'a dyn ForeignObject, name: &'a str) -> Result<Capability<'a>, BridgeError> {
    try_get_capability(handle, name).ok_or_else(|| BridgeError::MissingCapability(name.to_string()))
}

pub fn has_all(handle: &dyn ForeignObject, names: &[&str]) -> bool {
    names.iter().all(|name| handle.has_capability(name))
}

pub fn has_any(handle: &dyn ForeignObject, names: &[&str]) -> bool {
    names.iter().any(|name| handle.has_capability(name))
}
