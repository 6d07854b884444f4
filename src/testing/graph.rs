// src/testing/graph.rs
// Small property graph over petgraph for executing compiled filters.

use std::collections::BTreeMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};

use crate::datatypes::Value;

#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub labels: Vec<String>,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct EdgeData {
    pub rel_type: String,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct PropertyGraph {
    pub graph: StableDiGraph<NodeData, EdgeData>,
}

fn properties(props: &[(&str, Value)]) -> BTreeMap<String, Value> {
    props
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

impl PropertyGraph {
    pub fn new() -> Self {
        PropertyGraph::default()
    }

    pub fn add_node(&mut self, label: &str, props: &[(&str, Value)]) -> NodeIndex {
        self.graph.add_node(NodeData {
            labels: vec![label.to_string()],
            properties: properties(props),
        })
    }

    pub fn connect(
        &mut self,
        from: NodeIndex,
        rel_type: &str,
        to: NodeIndex,
        props: &[(&str, Value)],
    ) -> EdgeIndex {
        self.graph.add_edge(
            from,
            to,
            EdgeData {
                rel_type: rel_type.to_string(),
                properties: properties(props),
            },
        )
    }

    pub fn has_label(&self, node: NodeIndex, label: &str) -> bool {
        self.graph
            .node_weight(node)
            .map_or(false, |n| n.labels.iter().any(|l| l == label))
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| self.has_label(n, label))
            .collect()
    }

    pub fn node_property(&self, node: NodeIndex, key: &str) -> Value {
        self.graph
            .node_weight(node)
            .and_then(|n| n.properties.get(key).cloned())
            .unwrap_or(Value::Null)
    }

    pub fn edge_property(&self, edge: EdgeIndex, key: &str) -> Value {
        self.graph
            .edge_weight(edge)
            .and_then(|e| e.properties.get(key).cloned())
            .unwrap_or(Value::Null)
    }
}
