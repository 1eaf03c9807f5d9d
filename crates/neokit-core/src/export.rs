use crate::entity::{Entity, Node};
use crate::graph::GraphElementSet;
use neokit_common::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A node flattened for a write statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub identity: Option<i64>,
    pub labels: Vec<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// A relationship flattened for a write statement. `start` and `end` index
/// into [`SubgraphData::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub identity: Option<i64>,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start: usize,
    pub end: usize,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Plain data view of a set of graph elements, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphData {
    pub nodes: Vec<NodeData>,
    pub relationships: Vec<RelationshipData>,
}

fn node_data(node: &Node) -> Result<NodeData> {
    Ok(NodeData {
        identity: node.identity(),
        labels: node.labels().into_iter().collect(),
        properties: node.properties().to_json()?,
    })
}

impl SubgraphData {
    /// Fails with `NotFound` on a relationship whose endpoint is missing from
    /// the node set, and with `InvalidArgument` on a property JSON cannot hold.
    pub fn from_elements(elements: &impl GraphElementSet) -> Result<Self> {
        let nodes = elements.nodes();
        let index: HashMap<&Node, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

        let mut relationships = Vec::new();
        for rel in elements.relationships().iter() {
            let (start, end) = rel.endpoints();
            let lookup = |n: &Node| {
                index.get(n).copied().ok_or_else(|| {
                    GraphError::NotFound(format!("endpoint {} of {} is not in the node set", n, rel))
                })
            };
            relationships.push(RelationshipData {
                identity: rel.identity(),
                rel_type: rel.rel_type().to_string(),
                start: lookup(start)?,
                end: lookup(end)?,
                properties: rel.properties().to_json()?,
            });
        }

        Ok(Self {
            nodes: nodes.iter().map(node_data).collect::<Result<Vec<_>>>()?,
            relationships,
        })
    }

    /// Node indices grouped by label set, one group per distinct set.
    pub fn nodes_by_labels(&self) -> BTreeMap<BTreeSet<String>, Vec<usize>> {
        let mut groups: BTreeMap<BTreeSet<String>, Vec<usize>> = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let key = node.labels.iter().cloned().collect();
            groups.entry(key).or_default().push(i);
        }
        groups
    }

    /// Relationship indices grouped by type.
    pub fn relationships_by_type(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, rel) in self.relationships.iter().enumerate() {
            groups.entry(rel.rel_type.as_str()).or_default().push(i);
        }
        groups
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| GraphError::invalid(e.to_string()))
    }
}
