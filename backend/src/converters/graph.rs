//! GraphConverter - foreign graph → [`AttributedGraph`]
//!
//! # Algorithm
//!
//! 1. Read the vertex and edge sets (failure aborts the conversion)
//! 2. Detect vertex and edge kinds from the first element of each set
//! 3. Add every vertex with its extracted attributes, indexing it by the
//!    foreign runtime's own hash and equality
//! 4. Resolve each edge's endpoints through the graph handle, dropping
//!    self-loops when requested
//!
//! # Critical Invariants
//!
//! - The result is always directed
//! - Self-loops are detected with foreign equality, never host identity
//! - A failed attribute read or an unresolvable edge never aborts the graph

use super::attributes::{AttributeExtractor, ExtractorRegistry};
use super::{ConvertOptions, Converter};
use crate::bridge::{require_capability, ForeignObject, ForeignValue};
use crate::config::DisplayConfig;
use crate::native::{AttributeMap, AttributedGraph};
use crate::probe::patterns::{is_graph_like, GRAPH_EDGE_SET, GRAPH_EDGE_SOURCE, GRAPH_EDGE_TARGET, GRAPH_VERTEX_SET};
use crate::result::{ConversionError, ConversionResult, NativeValue, ResultKind};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Layout hint per detected vertex kind
pub const VERTEX_LAYOUTS: &[(&str, &str)] = &[
    ("SWCPoint", "tree"),
    ("Path", "hierarchical"),
    ("BrainAnnotation", "radial"),
];

/// Force-directed layout used for every other kind
pub const DEFAULT_LAYOUT: &str = "spring";

pub fn layout_for(vertex_kind: &str) -> &'static str {
    VERTEX_LAYOUTS
        .iter()
        .find(|(kind, _)| *kind == vertex_kind)
        .map(|(_, layout)| *layout)
        .unwrap_or(DEFAULT_LAYOUT)
}

pub struct GraphConverter {
    vertex_extractors: ExtractorRegistry,
    edge_extractors: ExtractorRegistry,
}

impl GraphConverter {
    /// Converter with the built-in vertex and edge kinds
    pub fn new() -> Self {
        Self::with_extractors(ExtractorRegistry::vertex_defaults(), ExtractorRegistry::edge_defaults())
    }

    pub fn with_extractors(vertex_extractors: ExtractorRegistry, edge_extractors: ExtractorRegistry) -> Self {
        Self {
            vertex_extractors,
            edge_extractors,
        }
    }

    fn try_convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions) -> Result<ConversionResult, ConversionError> {
        let vertices = require_capability(handle, GRAPH_VERTEX_SET)?.call_list()?;
        let edges = require_capability(handle, GRAPH_EDGE_SET)?.call_list()?;

        let vertex_extractor = self.vertex_extractors.detect(vertices.first().and_then(as_handle));
        let edge_extractor = self.edge_extractors.detect(edges.first().and_then(as_handle));

        let vertex_attributes = requested(vertex_extractor, options.node_attributes.as_ref());
        let edge_attributes = requested(edge_extractor, options.edge_attributes.as_ref());

        let mut graph = AttributedGraph::new_directed();
        let mut index = VertexIndex::default();
        for vertex in &vertices {
            let attributes = extract(vertex_extractor, vertex, &vertex_attributes);
            let id = graph.add_node(vertex.to_string(), attributes);
            index.insert(vertex, id);
        }

        let mut self_loops_removed = 0usize;
        for edge in &edges {
            let endpoints = handle
                .invoke(GRAPH_EDGE_SOURCE, std::slice::from_ref(edge))
                .and_then(|s| Ok((s, handle.invoke(GRAPH_EDGE_TARGET, std::slice::from_ref(edge))?)));
            let (source, target) = match endpoints {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("Skipping edge {} of {}: {}", edge, handle.type_name(), e);
                    continue;
                }
            };

            if options.remove_self_loops && source.foreign_eq(&target) {
                self_loops_removed += 1;
                continue;
            }

            let (Some(s), Some(t)) = (index.lookup(&source), index.lookup(&target)) else {
                debug!("Skipping edge {}: endpoint outside the vertex set", edge);
                continue;
            };
            graph.add_edge(s, t, extract(edge_extractor, edge, &edge_attributes));
        }

        info!(
            "Converted {} to graph with {} vertices and {} edges ({} self-loops removed)",
            handle.type_name(),
            graph.node_count(),
            graph.edge_count(),
            self_loops_removed
        );

        let vertex_count = graph.node_count();
        let edge_count = graph.edge_count();
        let mut result = ConversionResult::success(NativeValue::Graph(graph), handle.type_name())
            .with_metadata("vertex_count", vertex_count)
            .with_metadata("edge_count", edge_count);

        if options.include_metadata {
            let vertex_kind = vertex_extractor.kind();
            result.insert_metadata("vertex_type", vertex_kind);
            result.insert_metadata("edge_type", edge_extractor.kind());
            result.insert_metadata("is_directed", true);
            result.insert_metadata("layout", layout_for(vertex_kind));
            result.insert_metadata("self_loops_removed", self_loops_removed);
            result.insert_metadata("vertex_attributes", vertex_attributes.into_iter().collect::<Vec<_>>());
            result.insert_metadata("edge_attributes", edge_attributes.into_iter().collect::<Vec<_>>());
        }
        Ok(result)
    }
}

impl Default for GraphConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for GraphConverter {
    fn name(&self) -> &str {
        "graph"
    }

    fn predicate_name(&self) -> &str {
        "is_graph_like"
    }

    fn converter_name(&self) -> &str {
        "convert_graph"
    }

    fn accepts(&self, handle: &dyn ForeignObject) -> bool {
        is_graph_like(handle)
    }

    fn convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions, _config: &DisplayConfig) -> ConversionResult {
        self.try_convert(handle, options)
            .unwrap_or_else(|e| ConversionResult::failure(ResultKind::Graph, e, handle.type_name()))
    }
}

fn as_handle(value: &ForeignValue) -> Option<&dyn ForeignObject> {
    value.as_object().map(|obj| obj.as_ref())
}

fn requested(extractor: &dyn AttributeExtractor, explicit: Option<&BTreeSet<String>>) -> BTreeSet<String> {
    match explicit {
        Some(names) => names.clone(),
        None => extractor.default_attributes().into_iter().collect(),
    }
}

fn extract(extractor: &dyn AttributeExtractor, element: &ForeignValue, names: &BTreeSet<String>) -> AttributeMap {
    match as_handle(element) {
        Some(obj) if !names.is_empty() => extractor.extract(obj, names),
        _ => AttributeMap::new(),
    }
}

/// Vertex lookup keyed the way the foreign runtime compares vertices
#[derive(Default)]
struct VertexIndex {
    objects: HashMap<u64, Vec<(ForeignValue, usize)>>,
    primitives: HashMap<String, usize>,
}

impl VertexIndex {
    fn insert(&mut self, vertex: &ForeignValue, id: usize) {
        match vertex {
            ForeignValue::Object(obj) => self
                .objects
                .entry(obj.foreign_hash())
                .or_default()
                .push((vertex.clone(), id)),
            other => {
                self.primitives.entry(primitive_key(other)).or_insert(id);
            }
        }
    }

    fn lookup(&self, vertex: &ForeignValue) -> Option<usize> {
        match vertex {
            ForeignValue::Object(obj) => self
                .objects
                .get(&obj.foreign_hash())?
                .iter()
                .find(|(candidate, _)| candidate.foreign_eq(vertex))
                .map(|(_, id)| *id),
            other => self.primitives.get(&primitive_key(other)).copied(),
        }
    }
}

fn primitive_key(value: &ForeignValue) -> String {
    format!("{}:{}", value.variant_name(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ForeignRef, ScriptedObject};

    fn vertex(name: &str) -> ForeignRef {
        ScriptedObject::new("Path")
            .equality_key(name)
            .describe_as(name)
            .returning("getName", ForeignValue::Str(name.into()))
            .returning("getOrder", ForeignValue::Int(1))
            .returning("getLength", ForeignValue::Float(2.0))
            .into_ref()
    }

    fn graph_of(edges: Vec<(&'static str, &'static str)>) -> ScriptedObject {
        let names: Vec<&str> = vec!["a", "b", "c"];
        let vertex_values: Vec<ForeignValue> = names.iter().map(|n| ForeignValue::Object(vertex(n))).collect();
        let edge_values: Vec<ForeignValue> = edges
            .iter()
            .map(|(s, t)| ForeignValue::Str(format!("{}->{}", s, t)))
            .collect();

        let endpoint = |pick_source: bool| {
            move |args: &[ForeignValue]| -> Result<ForeignValue, crate::bridge::BridgeError> {
                let label = args[0].as_str().unwrap_or_default().to_string();
                let (s, t) = label.split_once("->").unwrap_or(("", ""));
                Ok(ForeignValue::Object(vertex(if pick_source { s } else { t })))
            }
        };

        ScriptedObject::new("DirectedWeightedGraph")
            .returning(GRAPH_VERTEX_SET, ForeignValue::List(vertex_values))
            .returning(GRAPH_EDGE_SET, ForeignValue::List(edge_values))
            .method(GRAPH_EDGE_SOURCE, endpoint(true))
            .method(GRAPH_EDGE_TARGET, endpoint(false))
    }

    #[test]
    fn test_endpoints_resolved_by_foreign_equality() {
        let graph = graph_of(vec![("a", "b"), ("b", "c")]);
        let result = GraphConverter::new().convert(&graph, &ConvertOptions::default(), &DisplayConfig::default());

        let Some(NativeValue::Graph(g)) = result.payload() else {
            panic!("expected graph payload, got {:?}", result.error());
        };
        assert_eq!(g.node_count(), 3);
        assert!(g.has_edge(0, 1));
        assert!(g.has_edge(1, 2));
        assert_eq!(result.metadata()["vertex_type"], "Path");
        assert_eq!(result.metadata()["layout"], "hierarchical");
    }

    #[test]
    fn test_primitive_edges_classify_as_unknown() {
        let graph = graph_of(vec![("a", "b")]);
        let result = GraphConverter::new().convert(&graph, &ConvertOptions::default(), &DisplayConfig::default());
        assert_eq!(result.metadata()["edge_type"], "Unknown");
    }

    #[test]
    fn test_include_metadata_false_keeps_counts_only() {
        let graph = graph_of(vec![("a", "b")]);
        let options = ConvertOptions {
            include_metadata: false,
            ..ConvertOptions::default()
        };
        let result = GraphConverter::new().convert(&graph, &options, &DisplayConfig::default());

        let keys: Vec<&str> = result.metadata().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["edge_count", "source_type", "vertex_count"]);
    }

    #[test]
    fn test_missing_edge_set_is_structural_failure() {
        let graph = ScriptedObject::new("Broken").returning(GRAPH_VERTEX_SET, ForeignValue::List(vec![]));
        let result = GraphConverter::new().convert(&graph, &ConvertOptions::default(), &DisplayConfig::default());
        assert!(matches!(result.error(), Some(ConversionError::MissingCapability(name)) if name == GRAPH_EDGE_SET));
        assert!(result.payload().is_none());
    }

    #[test]
    fn test_layout_lookup_defaults_to_spring() {
        assert_eq!(layout_for("SWCPoint"), "tree");
        assert_eq!(layout_for("Unknown"), DEFAULT_LAYOUT);
    }
}
