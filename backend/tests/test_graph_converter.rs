//! Tests for GraphConverter and the attribute extractor registry
//!
//! Vertices are scripted SWC points compared by an equality key, so edge
//! endpoints returned by the graph are distinct host objects that are equal
//! on the foreign side.

use foreign_display_core_rs::bridge::{BridgeError, ForeignObject, ForeignRef, ForeignValue, ScriptedObject};
use foreign_display_core_rs::converters::attributes::{AttributeSpec, DeclaredExtractor};
use foreign_display_core_rs::converters::graph::GraphConverter;
use foreign_display_core_rs::converters::{ConvertOptions, Converter, ExtractorRegistry, UNKNOWN_KIND};
use foreign_display_core_rs::native::AttributedGraph;
use foreign_display_core_rs::{ConversionResult, DisplayConfig, NativeValue};
use serde_json::json;
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn point(id: i64) -> ForeignRef {
    ScriptedObject::new("SWCPoint")
        .equality_key(format!("point-{}", id))
        .describe_as(format!("SWCPoint [{}]", id))
        .attribute("x", ForeignValue::Float(id as f64))
        .attribute("y", ForeignValue::Float(0.0))
        .attribute("z", ForeignValue::Float(0.0))
        .attribute("radius", ForeignValue::Float(1.5))
        .attribute("type", ForeignValue::Int(2))
        .returning("getColor", ForeignValue::Str("#00ff00".into()))
        .into_ref()
}

/// Edge "a->b" as a weighted-edge object whose endpoints are encoded in its name
fn edge(source: i64, target: i64) -> ForeignRef {
    ScriptedObject::new("SWCWeightedEdge")
        .equality_key(format!("{}->{}", source, target))
        .describe_as(format!("{}->{}", source, target))
        .returning("getWeight", ForeignValue::Float(1.0))
        .returning("getLength", ForeignValue::Float((target - source).abs() as f64))
        .into_ref()
}

fn endpoints(e: &ForeignValue) -> Option<(i64, i64)> {
    let text = e.as_object()?.describe();
    let (s, t) = text.split_once("->")?;
    Some((s.parse().ok()?, t.parse().ok()?))
}

fn graph_handle(vertex_count: i64, edges: &[(i64, i64)]) -> ScriptedObject {
    let vertices: Vec<ForeignValue> = (0..vertex_count).map(|i| ForeignValue::Object(point(i))).collect();
    let edge_values: Vec<ForeignValue> = edges.iter().map(|&(s, t)| ForeignValue::Object(edge(s, t))).collect();

    let resolve = |pick_source: bool| {
        move |args: &[ForeignValue]| -> Result<ForeignValue, BridgeError> {
            let (s, t) = endpoints(&args[0]).ok_or_else(|| BridgeError::CallFailed {
                name: "endpoint".into(),
                message: "not an edge".into(),
            })?;
            Ok(ForeignValue::Object(point(if pick_source { s } else { t })))
        }
    };

    ScriptedObject::new("DirectedWeightedGraph")
        .returning("vertexSet", ForeignValue::List(vertices))
        .returning("edgeSet", ForeignValue::List(edge_values))
        .method("getEdgeSource", resolve(true))
        .method("getEdgeTarget", resolve(false))
}

fn convert(handle: &ScriptedObject, options: &ConvertOptions) -> ConversionResult {
    GraphConverter::new().convert(handle, options, &DisplayConfig::default())
}

fn graph_of(result: &ConversionResult) -> &AttributedGraph {
    match result.payload() {
        Some(NativeValue::Graph(graph)) => graph,
        other => panic!("expected graph, got {:?} / {:?}", other, result.error()),
    }
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Self-Loop Removal
// ============================================================================

#[test]
fn test_self_loop_removed_by_default() {
    let handle = graph_handle(3, &[(0, 1), (1, 2), (2, 2)]);
    let result = convert(&handle, &ConvertOptions::default());
    let graph = graph_of(&result);

    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.self_loop_count(), 0);
    assert_eq!(result.metadata()["self_loops_removed"], json!(1));
    assert_eq!(result.metadata()["edge_count"], json!(2));
}

#[test]
fn test_self_loop_kept_when_requested() {
    let handle = graph_handle(3, &[(0, 1), (1, 2), (2, 2)]);
    let options = ConvertOptions {
        remove_self_loops: false,
        ..ConvertOptions::default()
    };
    let result = convert(&handle, &options);
    let graph = graph_of(&result);

    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.self_loop_count(), 1);
}

#[test]
fn test_directed_edges_follow_endpoints() {
    let handle = graph_handle(3, &[(2, 0)]);
    let result = convert(&handle, &ConvertOptions::default());
    let graph = graph_of(&result);

    assert!(graph.is_directed());
    assert!(graph.has_edge(2, 0));
    assert!(!graph.has_edge(0, 2));
    assert_eq!(graph.out_degree(2), 1);
    assert_eq!(graph.in_degree(0), 1);
}

// ============================================================================
// Kind Detection and Attributes
// ============================================================================

#[test]
fn test_metadata_records_kinds_and_layout() {
    let handle = graph_handle(2, &[(0, 1)]);
    let result = convert(&handle, &ConvertOptions::default());
    let metadata = result.metadata();

    assert_eq!(metadata["vertex_type"], json!("SWCPoint"));
    assert_eq!(metadata["edge_type"], json!("SWCWeightedEdge"));
    assert_eq!(metadata["vertex_count"], json!(2));
    assert_eq!(metadata["is_directed"], json!(true));
    assert_eq!(metadata["layout"], json!("tree"));
    assert_eq!(metadata["vertex_attributes"], json!(["radius", "type", "x", "y", "z"]));
    assert_eq!(metadata["source_type"], json!("DirectedWeightedGraph"));
}

#[test]
fn test_default_vertex_attributes_extracted() {
    let handle = graph_handle(2, &[(0, 1)]);
    let result = convert(&handle, &ConvertOptions::default());
    let graph = graph_of(&result);

    let node = graph.node(1).expect("vertex 1");
    assert_eq!(node.label, "SWCPoint [1]");
    assert_eq!(node.attributes["x"], json!(1.0));
    assert_eq!(node.attributes["radius"], json!(1.5));
    assert!(!node.attributes.contains_key("color_hex"));

    let edge = &graph.edges()[0];
    assert_eq!(edge.attributes["length"], json!(1.0));
    assert_eq!(edge.attributes["weight"], json!(1.0));
}

#[test]
fn test_explicit_attributes_expand_color() {
    let handle = graph_handle(1, &[]);
    let options = ConvertOptions {
        node_attributes: Some(names(&["x", "color", "no_such_field"])),
        ..ConvertOptions::default()
    };
    let result = convert(&handle, &options);
    let node = graph_of(&result).node(0).expect("vertex 0");

    assert_eq!(node.attributes["color_rgb"], json!([0, 255, 0]));
    assert_eq!(node.attributes["color_hex"], json!("#00ff00"));
    assert_eq!(node.attributes.len(), 3);
}

#[test]
fn test_unknown_vertex_kind_is_not_an_error() {
    let vertices = vec![ForeignValue::Str("a".into()), ForeignValue::Str("b".into())];
    let handle = ScriptedObject::new("SimpleGraph")
        .returning("vertexSet", ForeignValue::List(vertices))
        .returning("edgeSet", ForeignValue::List(vec![ForeignValue::Int(0)]))
        .returning("getEdgeSource", ForeignValue::Str("a".into()))
        .returning("getEdgeTarget", ForeignValue::Str("b".into()));

    let result = convert(&handle, &ConvertOptions::default());
    let graph = graph_of(&result);

    assert_eq!(result.metadata()["vertex_type"], json!(UNKNOWN_KIND));
    assert_eq!(result.metadata()["layout"], json!("spring"));
    assert!(graph.has_edge(0, 1));
    assert!(graph.nodes().iter().all(|n| n.attributes.is_empty()));
}

#[test]
fn test_empty_graph_converts() {
    let handle = graph_handle(0, &[]);
    let result = convert(&handle, &ConvertOptions::default());

    assert_eq!(graph_of(&result).node_count(), 0);
    assert_eq!(result.metadata()["vertex_type"], json!(UNKNOWN_KIND));
    assert_eq!(result.metadata()["edge_type"], json!(UNKNOWN_KIND));
}

#[test]
fn test_custom_extractor_registry() {
    const LABELLED: DeclaredExtractor = DeclaredExtractor {
        kind: "Labelled",
        signature: &["getLabel"],
        defaults: &["label"],
        attributes: &[AttributeSpec::direct("label", "getLabel")],
    };
    let mut vertex_kinds = ExtractorRegistry::new();
    vertex_kinds.register(Box::new(LABELLED));
    let converter = GraphConverter::with_extractors(vertex_kinds, ExtractorRegistry::edge_defaults());

    let vertex = ScriptedObject::new("Node")
        .returning("getLabel", ForeignValue::Str("soma".into()))
        .into_ref();
    let handle = ScriptedObject::new("Graph")
        .returning("vertexSet", ForeignValue::List(vec![ForeignValue::Object(vertex)]))
        .returning("edgeSet", ForeignValue::List(Vec::new()))
        .returning("getEdgeSource", ForeignValue::Null)
        .returning("getEdgeTarget", ForeignValue::Null);

    let result = converter.convert(&handle, &ConvertOptions::default(), &DisplayConfig::default());
    assert_eq!(result.metadata()["vertex_type"], json!("Labelled"));
    assert_eq!(graph_of(&result).node(0).expect("vertex").attributes["label"], json!("soma"));
}

#[test]
fn test_unreadable_vertex_set_fails() {
    let handle = graph_handle(2, &[]).failing("vertexSet", "graph disposed");
    let result = convert(&handle, &ConvertOptions::default());
    assert!(result.error().is_some());
    assert!(result.payload().is_none());
    assert!(handle.has_capability("edgeSet"));
}
