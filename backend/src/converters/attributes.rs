//! AttributeExtractor registry
//!
//! Graph vertices and edges come in a handful of known kinds. Each kind is
//! detected from one sample element's capabilities and declares the
//! attributes it can produce, which of those are extracted by default, and
//! how each one is read.
//!
//! # Attribute Sources
//!
//! - **Direct**: read a single field by name
//! - **Color**: expands to `{name}_rgb` (`[r, g, b]`) and `{name}_hex` (`"#rrggbb"`)
//! - **Parent**: expands to `{name}_id` and `{name}_name` of the referenced element
//!
//! A failing read only drops that attribute from the element's map.

use crate::bridge::{first_capability, has_all, BridgeError, ForeignObject, ForeignValue};
use crate::native::AttributeMap;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Kind reported when no registered extractor matches
pub const UNKNOWN_KIND: &str = "Unknown";

/// Kind-specific attribute reader
pub trait AttributeExtractor {
    fn kind(&self) -> &str;

    /// Does a sample element have this kind's structural signature?
    fn matches(&self, sample: &dyn ForeignObject) -> bool;

    fn default_attributes(&self) -> Vec<String>;

    /// Read `requested` attributes off `element`; unreadable ones are omitted
    fn extract(&self, element: &dyn ForeignObject, requested: &BTreeSet<String>) -> AttributeMap;
}

/// How a declared attribute is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSource {
    Direct(&'static str),
    Color(&'static str),
    Parent(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub source: AttributeSource,
}

impl AttributeSpec {
    pub const fn direct(name: &'static str, accessor: &'static str) -> Self {
        Self {
            name,
            source: AttributeSource::Direct(accessor),
        }
    }

    pub const fn color(name: &'static str, accessor: &'static str) -> Self {
        Self {
            name,
            source: AttributeSource::Color(accessor),
        }
    }

    pub const fn parent(name: &'static str, accessor: &'static str) -> Self {
        Self {
            name,
            source: AttributeSource::Parent(accessor),
        }
    }
}

/// Extractor described by a static table
#[derive(Debug, Clone, Copy)]
pub struct DeclaredExtractor {
    pub kind: &'static str,
    pub signature: &'static [&'static str],
    pub defaults: &'static [&'static str],
    pub attributes: &'static [AttributeSpec],
}

impl AttributeExtractor for DeclaredExtractor {
    fn kind(&self) -> &str {
        self.kind
    }

    fn matches(&self, sample: &dyn ForeignObject) -> bool {
        has_all(sample, self.signature)
    }

    fn default_attributes(&self) -> Vec<String> {
        self.defaults.iter().map(|s| s.to_string()).collect()
    }

    fn extract(&self, element: &dyn ForeignObject, requested: &BTreeSet<String>) -> AttributeMap {
        let mut out = AttributeMap::new();
        for name in requested {
            let outcome = match self.attributes.iter().find(|spec| spec.name == name) {
                Some(spec) => read_declared(element, spec, &mut out),
                None => read_by_name(element, name, &mut out),
            };
            if let Err(e) = outcome {
                debug!("Attribute '{}' of {} skipped: {}", name, self.kind, e);
            }
        }
        out
    }
}

/// Extractor for unrecognized elements: no defaults, explicit names read directly
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownExtractor;

impl AttributeExtractor for UnknownExtractor {
    fn kind(&self) -> &str {
        UNKNOWN_KIND
    }

    fn matches(&self, _sample: &dyn ForeignObject) -> bool {
        false
    }

    fn default_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    fn extract(&self, element: &dyn ForeignObject, requested: &BTreeSet<String>) -> AttributeMap {
        let mut out = AttributeMap::new();
        for name in requested {
            if let Err(e) = read_by_name(element, name, &mut out) {
                debug!("Attribute '{}' of unknown element skipped: {}", name, e);
            }
        }
        out
    }
}

// Built-in vertex kinds

pub const SWC_POINT: DeclaredExtractor = DeclaredExtractor {
    kind: "SWCPoint",
    signature: &["x", "y", "z", "radius"],
    defaults: &["x", "y", "z", "radius", "type"],
    attributes: &[
        AttributeSpec::direct("x", "x"),
        AttributeSpec::direct("y", "y"),
        AttributeSpec::direct("z", "z"),
        AttributeSpec::direct("radius", "radius"),
        AttributeSpec::direct("type", "type"),
        AttributeSpec::direct("parent", "parent"),
        AttributeSpec::color("color", "getColor"),
        AttributeSpec::parent("path", "getPath"),
    ],
};

pub const PATH: DeclaredExtractor = DeclaredExtractor {
    kind: "Path",
    signature: &["getName", "getOrder", "getLength"],
    defaults: &["name", "id", "order", "length"],
    attributes: &[
        AttributeSpec::direct("name", "getName"),
        AttributeSpec::direct("id", "getID"),
        AttributeSpec::direct("order", "getOrder"),
        AttributeSpec::direct("length", "getLength"),
        AttributeSpec::color("color", "getColor"),
        AttributeSpec::parent("parent", "getParentPath"),
    ],
};

pub const BRAIN_ANNOTATION: DeclaredExtractor = DeclaredExtractor {
    kind: "BrainAnnotation",
    signature: &["acronym", "getOntologyDepth"],
    defaults: &["name", "acronym", "id", "depth"],
    attributes: &[
        AttributeSpec::direct("name", "name"),
        AttributeSpec::direct("acronym", "acronym"),
        AttributeSpec::direct("id", "id"),
        AttributeSpec::direct("depth", "getOntologyDepth"),
        AttributeSpec::color("color", "color"),
        AttributeSpec::parent("parent", "getParent"),
    ],
};

// Built-in edge kinds

pub const SWC_WEIGHTED_EDGE: DeclaredExtractor = DeclaredExtractor {
    kind: "SWCWeightedEdge",
    signature: &["getWeight", "getLength"],
    defaults: &["weight", "length"],
    attributes: &[
        AttributeSpec::direct("weight", "getWeight"),
        AttributeSpec::direct("length", "getLength"),
    ],
};

pub const WEIGHTED_EDGE: DeclaredExtractor = DeclaredExtractor {
    kind: "WeightedEdge",
    signature: &["getWeight"],
    defaults: &["weight"],
    attributes: &[AttributeSpec::direct("weight", "getWeight")],
};

/// Ordered extractors for one element role (vertex or edge)
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn AttributeExtractor>>,
    unknown: UnknownExtractor,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            unknown: UnknownExtractor,
        }
    }

    /// Built-in vertex kinds, most specific signature first
    pub fn vertex_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SWC_POINT));
        registry.register(Box::new(PATH));
        registry.register(Box::new(BRAIN_ANNOTATION));
        registry
    }

    /// Built-in edge kinds, most specific signature first
    pub fn edge_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SWC_WEIGHTED_EDGE));
        registry.register(Box::new(WEIGHTED_EDGE));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn AttributeExtractor>) {
        self.extractors.push(extractor);
    }

    /// Extractor for a sample element; `Unknown` when nothing matches or there is no sample
    pub fn detect(&self, sample: Option<&dyn ForeignObject>) -> &dyn AttributeExtractor {
        sample
            .and_then(|s| self.extractors.iter().find(|e| e.matches(s)))
            .map(|e| e.as_ref())
            .unwrap_or(&self.unknown)
    }

    pub fn kinds(&self) -> Vec<String> {
        self.extractors.iter().map(|e| e.kind().to_string()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_declared(element: &dyn ForeignObject, spec: &AttributeSpec, out: &mut AttributeMap) -> Result<(), BridgeError> {
    match spec.source {
        AttributeSource::Direct(accessor) => {
            let value = element.invoke(accessor, &[])?;
            out.insert(spec.name.to_string(), value.to_json());
        }
        AttributeSource::Color(accessor) => {
            let value = element.invoke(accessor, &[])?;
            let (r, g, b) = color_components(&value).ok_or_else(|| BridgeError::UnexpectedValue {
                name: accessor.to_string(),
                expected: "color",
                found: value.variant_name().to_string(),
            })?;
            out.insert(format!("{}_rgb", spec.name), Value::from(vec![r, g, b]));
            out.insert(format!("{}_hex", spec.name), Value::from(format!("#{:02x}{:02x}{:02x}", r, g, b)));
        }
        AttributeSource::Parent(accessor) => {
            let value = element.invoke(accessor, &[])?;
            let (id, name) = parent_fields(&value);
            out.insert(format!("{}_id", spec.name), id);
            out.insert(format!("{}_name", spec.name), name);
        }
    }
    Ok(())
}

/// Read an undeclared attribute: the name itself, then a `get`-prefixed accessor
fn read_by_name(element: &dyn ForeignObject, name: &str, out: &mut AttributeMap) -> Result<(), BridgeError> {
    let getter = getter_name(name);
    let cap = first_capability(element, &[name, getter.as_str()])
        .ok_or_else(|| BridgeError::MissingCapability(name.to_string()))?;
    let value = cap.call0()?;
    out.insert(name.to_string(), value.to_json());
    Ok(())
}

fn getter_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::from("get"),
    }
}

/// (r, g, b) from a color object, a numeric triple, or a `#rrggbb` string
fn color_components(value: &ForeignValue) -> Option<(u8, u8, u8)> {
    match value {
        ForeignValue::Object(obj) => {
            let channel = |names: &[&str]| -> Option<u8> {
                let v = first_capability(obj.as_ref(), names)?.call0().ok()?;
                channel_u8(&v)
            };
            Some((
                channel(&["getRed", "red"])?,
                channel(&["getGreen", "green"])?,
                channel(&["getBlue", "blue"])?,
            ))
        }
        ForeignValue::List(items) if items.len() >= 3 => {
            let unit_range = items[..3].iter().all(|v| matches!(v, ForeignValue::Float(f) if *f <= 1.0));
            let scale = |v: &ForeignValue| -> Option<u8> {
                if unit_range {
                    v.as_f64().map(|f| (f * 255.0).round().clamp(0.0, 255.0) as u8)
                } else {
                    channel_u8(v)
                }
            };
            Some((scale(&items[0])?, scale(&items[1])?, scale(&items[2])?))
        }
        ForeignValue::Str(s) => {
            let hex = s.strip_prefix('#')?;
            if hex.len() != 6 {
                return None;
            }
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Some((byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

fn channel_u8(value: &ForeignValue) -> Option<u8> {
    let v = value.as_f64()?;
    if (0.0..=255.0).contains(&v) {
        Some(v.round() as u8)
    } else {
        None
    }
}

/// (id, name) of a referenced parent element; a null parent yields nulls
fn parent_fields(value: &ForeignValue) -> (Value, Value) {
    match value {
        ForeignValue::Null => (Value::Null, Value::Null),
        ForeignValue::Object(obj) => {
            let handle = obj.as_ref();
            let id = first_capability(handle, &["getID", "getId", "id"])
                .and_then(|cap| cap.call0().ok())
                .map(|v| v.to_json())
                .unwrap_or_else(|| Value::from(handle.foreign_hash()));
            let name = first_capability(handle, &["getName", "name"])
                .and_then(|cap| cap.call_string().ok())
                .unwrap_or_else(|| handle.describe());
            (id, Value::from(name))
        }
        other => (other.to_json(), Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ScriptedObject;

    fn requested(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn swc_point() -> ScriptedObject {
        ScriptedObject::new("SWCPoint")
            .attribute("x", ForeignValue::Float(1.0))
            .attribute("y", ForeignValue::Float(2.0))
            .attribute("z", ForeignValue::Float(3.0))
            .attribute("radius", ForeignValue::Float(0.5))
            .attribute("type", ForeignValue::Int(3))
    }

    #[test]
    fn test_detect_swc_point() {
        let registry = ExtractorRegistry::vertex_defaults();
        let point = swc_point();
        assert_eq!(registry.detect(Some(&point)).kind(), "SWCPoint");
    }

    #[test]
    fn test_detect_unknown_without_sample() {
        let registry = ExtractorRegistry::vertex_defaults();
        let extractor = registry.detect(None);
        assert_eq!(extractor.kind(), UNKNOWN_KIND);
        assert!(extractor.default_attributes().is_empty());
    }

    #[test]
    fn test_edge_kind_prefers_specific_signature() {
        let registry = ExtractorRegistry::edge_defaults();
        let swc_edge = ScriptedObject::new("E")
            .returning("getWeight", ForeignValue::Float(1.0))
            .returning("getLength", ForeignValue::Float(2.0));
        let plain = ScriptedObject::new("E").returning("getWeight", ForeignValue::Float(1.0));

        assert_eq!(registry.detect(Some(&swc_edge)).kind(), "SWCWeightedEdge");
        assert_eq!(registry.detect(Some(&plain)).kind(), "WeightedEdge");
    }

    #[test]
    fn test_color_expands_to_rgb_and_hex() {
        let color = ScriptedObject::new("ColorRGB")
            .returning("getRed", ForeignValue::Int(255))
            .returning("getGreen", ForeignValue::Int(128))
            .returning("getBlue", ForeignValue::Int(0))
            .into_ref();
        let point = swc_point().returning("getColor", ForeignValue::Object(color));

        let attrs = SWC_POINT.extract(&point, &requested(&["color"]));
        assert_eq!(attrs["color_rgb"], serde_json::json!([255, 128, 0]));
        assert_eq!(attrs["color_hex"], Value::from("#ff8000"));
        assert!(!attrs.contains_key("color"));
    }

    #[test]
    fn test_failed_attribute_is_omitted() {
        let point = swc_point().failing("getColor", "NullPointerException");
        let attrs = SWC_POINT.extract(&point, &requested(&["x", "color", "radius"]));

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["x"], Value::from(1.0));
        assert!(!attrs.contains_key("color_rgb"));
    }

    #[test]
    fn test_parent_expansion() {
        let parent = ScriptedObject::new("Path")
            .returning("getID", ForeignValue::Int(7))
            .returning("getName", ForeignValue::Str("Path (7)".into()))
            .into_ref();
        let path = ScriptedObject::new("Path")
            .returning("getName", ForeignValue::Str("Path (8)".into()))
            .returning("getOrder", ForeignValue::Int(2))
            .returning("getLength", ForeignValue::Float(12.5))
            .returning("getParentPath", ForeignValue::Object(parent));

        let attrs = PATH.extract(&path, &requested(&["parent", "order"]));
        assert_eq!(attrs["parent_id"], Value::from(7));
        assert_eq!(attrs["parent_name"], Value::from("Path (7)"));
        assert_eq!(attrs["order"], Value::from(2));
    }

    #[test]
    fn test_root_parent_is_null() {
        let path = ScriptedObject::new("Path").returning("getParentPath", ForeignValue::Null);
        let attrs = PATH.extract(&path, &requested(&["parent"]));
        assert_eq!(attrs["parent_id"], Value::Null);
    }

    #[test]
    fn test_unknown_reads_explicit_names_via_getter() {
        let element = ScriptedObject::new("Custom").returning("getLabel", ForeignValue::Str("a".into()));
        let attrs = UnknownExtractor.extract(&element, &requested(&["label", "missing"]));
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["label"], Value::from("a"));
    }

    #[test]
    fn test_color_from_hex_and_unit_floats() {
        assert_eq!(color_components(&ForeignValue::Str("#0a0b0c".into())), Some((10, 11, 12)));
        let unit = ForeignValue::List(vec![
            ForeignValue::Float(1.0),
            ForeignValue::Float(0.0),
            ForeignValue::Float(0.5),
        ]);
        assert_eq!(color_components(&unit), Some((255, 0, 128)));
    }
}
