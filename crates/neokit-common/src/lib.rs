use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod value;

pub use error::{GraphError, Result};
pub use value::{PropertyValue, ValueKind};

/// Reference to a remote graph, identified by its service URI
/// (e.g. `bolt://localhost:7687/neo4j`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct GraphRef(Arc<str>);

impl GraphRef {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(Arc::from(uri.as_ref()))
    }

    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl From<String> for GraphRef {
    fn from(uri: String) -> Self {
        Self(Arc::from(uri))
    }
}

impl From<GraphRef> for String {
    fn from(graph: GraphRef) -> Self {
        graph.0.to_string()
    }
}

impl fmt::Display for GraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (graph, identity) pair that ties a local entity to a remote one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub graph: GraphRef,
    pub identity: i64,
}

impl Binding {
    pub fn new(graph: GraphRef, identity: i64) -> Result<Self> {
        if identity < 0 {
            return Err(GraphError::Binding(format!(
                "identity must be non-negative (got {})",
                identity
            )));
        }
        Ok(Self { graph, identity })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.graph, self.identity)
    }
}

/// A node as delivered by the query-execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub identity: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl NodeRecord {
    pub fn new(identity: i64) -> Self {
        Self {
            identity,
            labels: Vec::new(),
            properties: BTreeMap::new(),
        }
    }
}

/// A relationship as delivered by the query-execution layer. `start` and
/// `end` are node identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub identity: i64,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl RelationshipRecord {
    pub fn new(identity: i64, start: i64, rel_type: impl Into<String>, end: i64) -> Self {
        Self {
            identity,
            rel_type: rel_type.into(),
            start,
            end,
            properties: BTreeMap::new(),
        }
    }
}

/// A path: `nodes` in walk order, `relationships[i]` joining `nodes[i]` and
/// `nodes[i + 1]` in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}
