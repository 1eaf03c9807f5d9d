use crate::entity::{Node, Relationship};
use crate::graph::subgraph::{GraphElementSet, Subgraph};
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A directed petgraph view of a set of graph elements.
///
/// Node weights are the node handles themselves, so mutations made through
/// the projection show up on the original nodes. Indices follow the set's
/// insertion order.
pub struct Projection {
    pub graph: DiGraph<Node, Relationship>,
    /// Lookup table: node → petgraph index.
    pub indices: HashMap<Node, NodeIndex>,
}

impl Projection {
    pub fn from_elements(elements: &impl GraphElementSet) -> Self {
        let nodes = elements.nodes();
        let relationships = elements.relationships();
        let mut graph = DiGraph::with_capacity(nodes.len(), relationships.len());
        let mut indices = HashMap::with_capacity(nodes.len());

        for node in nodes.iter() {
            let idx = graph.add_node(node.clone());
            indices.insert(node.clone(), idx);
        }
        for rel in relationships.iter() {
            let (start, end) = rel.endpoints();
            // Endpoints of a member relationship are always members
            if let (Some(&from), Some(&to)) = (indices.get(start), indices.get(end)) {
                graph.add_edge(from, to, rel.clone());
            }
        }

        tracing::trace!(
            "Projected {} nodes and {} relationships",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph, indices }
    }

    pub fn index_of(&self, node: &Node) -> Option<NodeIndex> {
        self.indices.get(node).copied()
    }

    /// Number of weakly connected components.
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }
}

impl Subgraph {
    pub fn to_petgraph(&self) -> DiGraph<Node, Relationship> {
        Projection::from_elements(self).graph
    }

    pub fn component_count(&self) -> usize {
        Projection::from_elements(self).component_count()
    }
}
