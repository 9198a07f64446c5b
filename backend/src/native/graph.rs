//! Directed attributed graph
//!
//! Vertices are indexed in insertion order (the order the foreign vertex set
//! was iterated). Edges reference vertices by index.

use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute name → value
pub type AttributeMap = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: usize,
    pub label: String,
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub attributes: AttributeMap,
}

impl GraphEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    directed: bool,
}

impl AttributedGraph {
    pub fn new_directed() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            directed: true,
        }
    }

    /// Add a vertex and return its index
    pub fn add_node(&mut self, label: impl Into<String>, attributes: AttributeMap) -> usize {
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            id,
            label: label.into(),
            attributes,
        });
        id
    }

    /// Add an edge between existing vertices; returns false if either index is unknown
    pub fn add_edge(&mut self, source: usize, target: usize, attributes: AttributeMap) -> bool {
        if source >= self.nodes.len() || target >= self.nodes.len() {
            return false;
        }
        self.edges.push(GraphEdge {
            source,
            target,
            attributes,
        });
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: usize) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn has_edge(&self, source: usize, target: usize) -> bool {
        self.edges.iter().any(|e| e.source == source && e.target == target)
    }

    pub fn self_loop_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_self_loop()).count()
    }

    pub fn out_degree(&self, id: usize) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    pub fn in_degree(&self, id: usize) -> usize {
        self.edges.iter().filter(|e| e.target == id).count()
    }
}

impl Default for AttributedGraph {
    fn default() -> Self {
        Self::new_directed()
    }
}
