//! Values accepted by `display`
//!
//! A display call may receive a foreign handle, an already-native value, a
//! previously produced [`ConversionResult`], or a sequence of any of these.

use crate::bridge::ForeignRef;
use crate::result::{ConversionResult, NativeValue};
use std::fmt;

#[derive(Clone)]
pub enum DisplayObject {
    Foreign(ForeignRef),
    Native(NativeValue),
    Converted(ConversionResult),
    Sequence(Vec<DisplayObject>),
}

impl DisplayObject {
    /// Host identity used by the recursion guard (foreign handles only)
    pub fn identity(&self) -> Option<u64> {
        match self {
            DisplayObject::Foreign(handle) => Some(handle.identity()),
            _ => None,
        }
    }

    pub fn as_foreign(&self) -> Option<&ForeignRef> {
        match self {
            DisplayObject::Foreign(handle) => Some(handle),
            _ => None,
        }
    }

    /// Native value carried directly or as a conversion payload
    pub fn native_value(&self) -> Option<&NativeValue> {
        match self {
            DisplayObject::Native(value) => Some(value),
            DisplayObject::Converted(result) => result.payload(),
            _ => None,
        }
    }

    pub fn as_conversion(&self) -> Option<&ConversionResult> {
        match self {
            DisplayObject::Converted(result) => Some(result),
            _ => None,
        }
    }

    pub fn type_label(&self) -> String {
        match self {
            DisplayObject::Foreign(handle) => handle.type_name(),
            DisplayObject::Native(value) => value.type_label().to_string(),
            DisplayObject::Converted(_) => "ConversionResult".to_string(),
            DisplayObject::Sequence(items) => format!("Sequence[{}]", items.len()),
        }
    }

    /// Same underlying object: identical handle identity, or equal values
    pub fn same_as(&self, other: &DisplayObject) -> bool {
        match (self, other) {
            (DisplayObject::Foreign(a), DisplayObject::Foreign(b)) => a.identity() == b.identity(),
            (DisplayObject::Native(a), DisplayObject::Native(b)) => a == b,
            (DisplayObject::Converted(a), DisplayObject::Converted(b)) => a == b,
            (DisplayObject::Sequence(a), DisplayObject::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for DisplayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayObject::Foreign(handle) => write!(f, "Foreign({})", handle.describe()),
            DisplayObject::Native(value) => write!(f, "Native({})", value.type_label()),
            DisplayObject::Converted(result) => write!(f, "Converted({:?})", result.kind()),
            DisplayObject::Sequence(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<ForeignRef> for DisplayObject {
    fn from(handle: ForeignRef) -> Self {
        DisplayObject::Foreign(handle)
    }
}

impl From<NativeValue> for DisplayObject {
    fn from(value: NativeValue) -> Self {
        DisplayObject::Native(value)
    }
}

impl From<ConversionResult> for DisplayObject {
    fn from(result: ConversionResult) -> Self {
        DisplayObject::Converted(result)
    }
}

impl From<Vec<DisplayObject>> for DisplayObject {
    fn from(items: Vec<DisplayObject>) -> Self {
        DisplayObject::Sequence(items)
    }
}
