//! Conversion results
//!
//! A [`ConversionResult`] is the tagged outcome of converting one foreign
//! handle. It carries either a payload or an error, plus a metadata map that
//! layers may only add to.
//!
//! # Invariants
//!
//! 1. Exactly one of `payload` and `error` is present, except for
//!    [`ResultKind::Empty`] where both may be absent
//! 2. `metadata` always contains `source_type`
//! 3. There is no API to remove a metadata key

use crate::bridge::BridgeError;
use crate::native::{AttributedGraph, Figure, ObjectSummary, RasterImage, TabularFrame};
use crate::panels::PanelError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Metadata key present on every result
pub const SOURCE_TYPE_KEY: &str = "source_type";

/// Metadata attached to a result
pub type Metadata = BTreeMap<String, Value>;

/// Which converter family produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Table,
    Chart,
    Graph,
    Raster,
    Generic,
    Empty,
}

/// Host-native value produced by a converter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NativeValue {
    Table(TabularFrame),
    Figure(Figure),
    Graph(AttributedGraph),
    Raster(RasterImage),
    Generic(ObjectSummary),
}

impl NativeValue {
    pub fn kind(&self) -> ResultKind {
        match self {
            NativeValue::Table(_) => ResultKind::Table,
            NativeValue::Figure(_) => ResultKind::Chart,
            NativeValue::Graph(_) => ResultKind::Graph,
            NativeValue::Raster(_) => ResultKind::Raster,
            NativeValue::Generic(_) => ResultKind::Generic,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            NativeValue::Table(_) => "TabularFrame",
            NativeValue::Figure(_) => "Figure",
            NativeValue::Graph(_) => "AttributedGraph",
            NativeValue::Raster(_) => "RasterImage",
            NativeValue::Generic(_) => "ObjectSummary",
        }
    }
}

/// Structural conversion failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Missing required capability '{0}'")]
    MissingCapability(String),

    #[error("Foreign call failed: {0}")]
    Bridge(BridgeError),

    #[error("Serialized artifact is empty: {0}")]
    EmptyArtifact(String),

    #[error("Serialized artifact was not written: {0}")]
    MissingArtifact(String),

    #[error("Panel assembly failed: {0}")]
    Panel(PanelError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl From<BridgeError> for ConversionError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::MissingCapability(name) => ConversionError::MissingCapability(name),
            other => ConversionError::Bridge(other),
        }
    }
}

impl From<PanelError> for ConversionError {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::EmptyArtifact(path) => ConversionError::EmptyArtifact(path),
            other => ConversionError::Panel(other),
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::Io(err.to_string())
    }
}

/// Outcome of converting one foreign handle
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    kind: ResultKind,
    payload: Option<NativeValue>,
    metadata: Metadata,
    error: Option<ConversionError>,
}

impl ConversionResult {
    /// Successful conversion; the kind follows the payload
    pub fn success(payload: NativeValue, source_type: impl Into<String>) -> Self {
        Self {
            kind: payload.kind(),
            payload: Some(payload),
            metadata: source_metadata(source_type.into()),
            error: None,
        }
    }

    /// Structural failure of a converter of family `kind`
    pub fn failure(kind: ResultKind, error: ConversionError, source_type: impl Into<String>) -> Self {
        Self {
            kind,
            payload: None,
            metadata: source_metadata(source_type.into()),
            error: Some(error),
        }
    }

    /// Nothing to convert (e.g. an empty batch)
    pub fn empty(source_type: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Empty,
            payload: None,
            metadata: source_metadata(source_type.into()),
            error: None,
        }
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn payload(&self) -> Option<&NativeValue> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<NativeValue> {
        self.payload
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.payload.is_some() && self.error.is_none()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn source_type(&self) -> &str {
        self.metadata
            .get(SOURCE_TYPE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Set a metadata key (the required `source_type` key cannot be overwritten)
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key == SOURCE_TYPE_KEY {
            return;
        }
        self.metadata.insert(key, value.into());
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_metadata(key, value);
        self
    }

    /// Merge keys from another layer without touching keys already present
    pub fn extend_metadata(&mut self, other: Metadata) {
        for (key, value) in other {
            self.metadata.entry(key).or_insert(value);
        }
    }

    /// Check the payload/error exclusivity invariant
    pub fn is_well_formed(&self) -> bool {
        let has_source = self.metadata.contains_key(SOURCE_TYPE_KEY);
        let exclusive = match self.kind {
            ResultKind::Empty => !(self.payload.is_some() && self.error.is_some()),
            _ => self.payload.is_some() != self.error.is_some(),
        };
        has_source && exclusive
    }
}

fn source_metadata(source_type: String) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_TYPE_KEY.to_string(), Value::String(source_type));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{Column, TabularFrame};

    fn frame() -> NativeValue {
        NativeValue::Table(TabularFrame::new(vec![Column::new("a", vec![])], 0))
    }

    #[test]
    fn test_success_is_well_formed() {
        let result = ConversionResult::success(frame(), "Table");
        assert_eq!(result.kind(), ResultKind::Table);
        assert!(result.is_success());
        assert!(result.is_well_formed());
        assert_eq!(result.source_type(), "Table");
    }

    #[test]
    fn test_failure_is_well_formed() {
        let result = ConversionResult::failure(
            ResultKind::Chart,
            ConversionError::EmptyArtifact("chart.svg".into()),
            "Chart",
        );
        assert!(result.payload().is_none());
        assert!(result.error().is_some());
        assert!(result.is_well_formed());
    }

    #[test]
    fn test_empty_allows_neither() {
        let result = ConversionResult::empty("list");
        assert!(result.is_well_formed());
        assert!(!result.is_success());
    }

    #[test]
    fn test_source_type_cannot_be_replaced() {
        let mut result = ConversionResult::empty("Original");
        result.insert_metadata(SOURCE_TYPE_KEY, "Other");
        assert_eq!(result.source_type(), "Original");
    }

    #[test]
    fn test_extend_metadata_is_additive() {
        let mut result = ConversionResult::empty("T").with_metadata("format", "svg");
        let mut other = Metadata::new();
        other.insert("format".to_string(), Value::from("png"));
        other.insert("scale".to_string(), Value::from(2.0));
        result.extend_metadata(other);

        assert_eq!(result.metadata()["format"], Value::from("svg"));
        assert_eq!(result.metadata()["scale"], Value::from(2.0));
    }

    #[test]
    fn test_missing_capability_maps_from_bridge() {
        let err: ConversionError = BridgeError::MissingCapability("getRowCount".into()).into();
        assert_eq!(err, ConversionError::MissingCapability("getRowCount".into()));
    }
}
