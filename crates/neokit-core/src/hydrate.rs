// Hydration: turning records from the query-execution layer into bound
// entities.
//
// A node, relationship or path record is validated in full before the cache
// is touched, so a rejected record leaves the hydrator as it was. Row-level
// hydration is not atomic across columns.

use crate::entity::{Entity, Node, Relationship};
use crate::graph::{Path, Subgraph, Walkable};
use crate::property::PropertyDict;
use neokit_common::config::HydrationConfig;
use neokit_common::{
    Binding, GraphError, GraphRef, NodeRecord, PathRecord, PropertyValue, RelationshipRecord,
    Result,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// One hydrated value from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated {
    Node(Node),
    Relationship(Relationship),
    Path(Path),
    List(Vec<Hydrated>),
    /// Anything that is not a graph entity, passed through untouched.
    Value(serde_json::Value),
}

impl Hydrated {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Hydrated::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Hydrated::Relationship(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Hydrated::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// A result row keyed by column name.
pub type Row = BTreeMap<String, Hydrated>;

struct PreparedNode {
    binding: Binding,
    labels: BTreeSet<String>,
    properties: PropertyDict,
}

struct PreparedRelationship {
    binding: Binding,
    rel_type: String,
    start: i64,
    end: i64,
    properties: PropertyDict,
}

fn convert_properties(source: &BTreeMap<String, serde_json::Value>) -> Result<PropertyDict> {
    let mut properties = PropertyDict::new();
    for (key, value) in source {
        let value = PropertyValue::try_from(value.clone())
            .map_err(|e| GraphError::invalid(format!("property {}: {}", key, e)))?;
        properties.set(key.clone(), value);
    }
    Ok(properties)
}

fn decode<T: serde::de::DeserializeOwned>(value: &serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| GraphError::invalid(format!("malformed {} record: {}", what, e)))
}

/// Builds bound entities for one batch of results against one graph.
///
/// Within a batch a repeated identity always yields the same handle. Call
/// [`Hydrator::clear`] between batches that must not share entities.
pub struct Hydrator {
    graph: GraphRef,
    config: HydrationConfig,
    nodes: HashMap<i64, Node>,
    relationships: HashMap<i64, Relationship>,
    // Identities of nodes created only as relationship endpoints.
    placeholders: HashSet<i64>,
}

impl Hydrator {
    pub fn new(graph: GraphRef, config: HydrationConfig) -> Self {
        Self {
            graph,
            config,
            nodes: HashMap::new(),
            relationships: HashMap::new(),
            placeholders: HashSet::new(),
        }
    }

    pub fn graph(&self) -> &GraphRef {
        &self.graph
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// The cached node with this identity, if any.
    pub fn node(&self, identity: i64) -> Option<&Node> {
        self.nodes.get(&identity)
    }

    pub fn relationship(&self, identity: i64) -> Option<&Relationship> {
        self.relationships.get(&identity)
    }

    /// Everything hydrated so far.
    pub fn subgraph(&self) -> Subgraph {
        Subgraph::new(
            self.nodes.values().cloned(),
            self.relationships.values().cloned(),
        )
    }

    /// Forgets the batch. Entities already handed out stay bound.
    pub fn clear(&mut self) {
        tracing::debug!(
            "Clearing hydration cache ({} nodes, {} relationships)",
            self.nodes.len(),
            self.relationships.len()
        );
        self.nodes.clear();
        self.relationships.clear();
        self.placeholders.clear();
    }

    fn prepare_node(&self, record: &NodeRecord) -> Result<PreparedNode> {
        Ok(PreparedNode {
            binding: Binding::new(self.graph.clone(), record.identity)?,
            labels: record.labels.iter().cloned().collect(),
            properties: convert_properties(&record.properties)?,
        })
    }

    fn commit_node(&mut self, prepared: PreparedNode) -> Result<Node> {
        let identity = prepared.binding.identity;
        if let Some(node) = self.nodes.get(&identity) {
            if self.placeholders.remove(&identity) {
                tracing::debug!("Filling placeholder node {}", prepared.binding);
                node.replace_state(prepared.labels, prepared.properties);
            } else if self.config.refresh_existing {
                tracing::trace!("Refreshing cached node {}", prepared.binding);
                node.replace_state(prepared.labels, prepared.properties);
            } else {
                tracing::trace!("Reusing cached node {}", prepared.binding);
            }
            return Ok(node.clone());
        }

        let node = Node::with_state(prepared.labels, prepared.properties);
        node.bind(prepared.binding.graph, identity)?;
        self.nodes.insert(identity, node.clone());
        Ok(node)
    }

    /// `available` holds identities that will be cached by the time the
    /// relationship is committed.
    fn prepare_relationship(
        &self,
        record: &RelationshipRecord,
        available: &HashSet<i64>,
    ) -> Result<PreparedRelationship> {
        let binding = Binding::new(self.graph.clone(), record.identity)?;
        if record.rel_type.trim().is_empty() {
            return Err(GraphError::invalid(format!(
                "relationship {} has an empty type",
                binding
            )));
        }

        if let Some(existing) = self.relationships.get(&record.identity) {
            let (start, end) = existing.endpoints();
            if existing.rel_type() != record.rel_type
                || start.identity() != Some(record.start)
                || end.identity() != Some(record.end)
            {
                return Err(GraphError::Binding(format!(
                    "relationship {} was already hydrated as {}",
                    binding, existing
                )));
            }
        }

        for endpoint in [record.start, record.end] {
            if !available.contains(&endpoint)
                && !self.nodes.contains_key(&endpoint)
                && !self.config.placeholder_endpoints
            {
                return Err(GraphError::invalid(format!(
                    "relationship {} refers to node {} which is not in this batch",
                    binding, endpoint
                )));
            }
            // Fails early on a negative endpoint identity
            Binding::new(self.graph.clone(), endpoint)?;
        }

        Ok(PreparedRelationship {
            binding,
            rel_type: record.rel_type.clone(),
            start: record.start,
            end: record.end,
            properties: convert_properties(&record.properties)?,
        })
    }

    fn endpoint(&mut self, identity: i64) -> Result<Node> {
        if let Some(node) = self.nodes.get(&identity) {
            return Ok(node.clone());
        }
        tracing::debug!("Creating placeholder node {} on {}", identity, self.graph);
        let node = Node::default();
        node.bind(self.graph.clone(), identity)?;
        self.nodes.insert(identity, node.clone());
        self.placeholders.insert(identity);
        Ok(node)
    }

    fn commit_relationship(&mut self, prepared: PreparedRelationship) -> Result<Relationship> {
        let identity = prepared.binding.identity;
        if let Some(rel) = self.relationships.get(&identity) {
            if self.config.refresh_existing {
                tracing::trace!("Refreshing cached relationship {}", prepared.binding);
                rel.replace_properties(prepared.properties);
            }
            return Ok(rel.clone());
        }

        let start = self.endpoint(prepared.start)?;
        let end = self.endpoint(prepared.end)?;
        let rel = Relationship::new(&start, prepared.rel_type, &end)?;
        rel.replace_properties(prepared.properties);
        rel.bind(prepared.binding.graph, identity)?;
        self.relationships.insert(identity, rel.clone());
        Ok(rel)
    }

    pub fn hydrate_node(&mut self, record: &NodeRecord) -> Result<Node> {
        let prepared = self.prepare_node(record)?;
        self.commit_node(prepared)
    }

    /// Endpoints resolve through the cache; a missing one becomes a
    /// placeholder when configured, otherwise the call fails.
    pub fn hydrate_relationship(&mut self, record: &RelationshipRecord) -> Result<Relationship> {
        let prepared = self.prepare_relationship(record, &HashSet::new())?;
        self.commit_relationship(prepared)
    }

    pub fn hydrate_path(&mut self, record: &PathRecord) -> Result<Path> {
        if record.nodes.is_empty() {
            return Err(GraphError::invalid("a path record needs at least one node"));
        }
        if record.nodes.len() != record.relationships.len() + 1 {
            return Err(GraphError::invalid(format!(
                "a path record with {} relationships needs {} nodes, got {}",
                record.relationships.len(),
                record.relationships.len() + 1,
                record.nodes.len()
            )));
        }
        for (i, rel) in record.relationships.iter().enumerate() {
            let (from, to) = (record.nodes[i].identity, record.nodes[i + 1].identity);
            let joins = (rel.start == from && rel.end == to) || (rel.start == to && rel.end == from);
            if !joins {
                return Err(GraphError::invalid(format!(
                    "path relationship {} does not join nodes {} and {}",
                    rel.identity, from, to
                )));
            }
        }

        // The cache only catches conflicts with earlier batches; a path can
        // also contradict itself.
        let mut seen: HashMap<i64, &RelationshipRecord> = HashMap::new();
        for rel in &record.relationships {
            if let Some(first) = seen.insert(rel.identity, rel) {
                if (first.rel_type.as_str(), first.start, first.end)
                    != (rel.rel_type.as_str(), rel.start, rel.end)
                {
                    return Err(GraphError::Binding(format!(
                        "relationship {} appears in one path as both {}-[:{}]->{} and {}-[:{}]->{}",
                        rel.identity, first.start, first.rel_type, first.end, rel.start, rel.rel_type, rel.end
                    )));
                }
            }
        }

        let available: HashSet<i64> = record.nodes.iter().map(|n| n.identity).collect();
        let nodes = record
            .nodes
            .iter()
            .map(|n| self.prepare_node(n))
            .collect::<Result<Vec<_>>>()?;
        let relationships = record
            .relationships
            .iter()
            .map(|r| self.prepare_relationship(r, &available))
            .collect::<Result<Vec<_>>>()?;

        let nodes = nodes
            .into_iter()
            .map(|p| self.commit_node(p))
            .collect::<Result<Vec<_>>>()?;
        let relationships = relationships
            .into_iter()
            .map(|p| self.commit_relationship(p))
            .collect::<Result<Vec<_>>>()?;
        Walkable::new(nodes, relationships)
    }

    /// Hydrates a JSON value of any shape. Objects that look like a node,
    /// relationship or path record are hydrated; arrays are walked; anything
    /// else passes through.
    pub fn hydrate_value(&mut self, value: &serde_json::Value) -> Result<Hydrated> {
        match value {
            serde_json::Value::Object(map) if map.contains_key("identity") => {
                if map.contains_key("type") && map.contains_key("start") && map.contains_key("end") {
                    let record: RelationshipRecord = decode(value, "relationship")?;
                    self.hydrate_relationship(&record).map(Hydrated::Relationship)
                } else {
                    let record: NodeRecord = decode(value, "node")?;
                    self.hydrate_node(&record).map(Hydrated::Node)
                }
            }
            serde_json::Value::Object(map) if map.get("nodes").map_or(false, |n| n.is_array()) => {
                let record: PathRecord = decode(value, "path")?;
                self.hydrate_path(&record).map(Hydrated::Path)
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.hydrate_value(item))
                .collect::<Result<Vec<_>>>()
                .map(Hydrated::List),
            other => Ok(Hydrated::Value(other.clone())),
        }
    }

    /// Hydrates result rows, each a JSON object keyed by column name.
    pub fn hydrate_records(&mut self, rows: &[serde_json::Value]) -> Result<Vec<Row>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let columns = row
                .as_object()
                .ok_or_else(|| GraphError::invalid(format!("a result row must be an object, got {}", row)))?;
            let mut hydrated = Row::new();
            for (column, value) in columns {
                hydrated.insert(column.clone(), self.hydrate_value(value)?);
            }
            out.push(hydrated);
        }
        tracing::debug!(
            "Hydrated {} rows ({} nodes, {} relationships cached)",
            out.len(),
            self.nodes.len(),
            self.relationships.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphElementSet;
    use serde_json::json;

    fn hydrator(config: HydrationConfig) -> Hydrator {
        Hydrator::new(GraphRef::new("bolt://localhost:7687"), config)
    }

    fn person(identity: i64, name: &str) -> NodeRecord {
        let mut record = NodeRecord::new(identity);
        record.labels.push("Person".to_string());
        record.properties.insert("name".to_string(), json!(name));
        record
    }

    #[test]
    fn test_hydrate_node_binds() {
        let mut h = hydrator(HydrationConfig::default());
        let node = h.hydrate_node(&person(1, "Alice")).unwrap();
        assert_eq!(node.identity(), Some(1));
        assert_eq!(node.graph().unwrap().uri(), "bolt://localhost:7687");
        assert!(node.has_label("Person"));
        assert_eq!(node.get("name"), Some(PropertyValue::from("Alice")));
    }

    #[test]
    fn test_repeated_identity_reuses_handle() {
        let mut h = hydrator(HydrationConfig::default());
        let first = h.hydrate_node(&person(1, "Alice")).unwrap();
        let second = h.hydrate_node(&person(1, "Alicia")).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.get("name"), Some(PropertyValue::from("Alicia")));
    }

    #[test]
    fn test_refresh_disabled_keeps_first_record() {
        let mut h = hydrator(HydrationConfig {
            refresh_existing: false,
            ..HydrationConfig::default()
        });
        let first = h.hydrate_node(&person(1, "Alice")).unwrap();
        h.hydrate_node(&person(1, "Alicia")).unwrap();
        assert_eq!(first.get("name"), Some(PropertyValue::from("Alice")));
    }

    #[test]
    fn test_invalid_property_leaves_cache_untouched() {
        let mut h = hydrator(HydrationConfig::default());
        let mut record = person(1, "Alice");
        record.properties.insert("nested".to_string(), json!({"a": 1}));
        assert!(matches!(h.hydrate_node(&record), Err(GraphError::InvalidArgument(_))));
        assert!(h.node(1).is_none());
    }

    #[test]
    fn test_null_properties_are_dropped() {
        let mut h = hydrator(HydrationConfig::default());
        let mut record = person(1, "Alice");
        record.properties.insert("age".to_string(), serde_json::Value::Null);
        let node = h.hydrate_node(&record).unwrap();
        assert!(!node.contains_key("age"));
    }

    #[test]
    fn test_relationship_resolves_endpoints() {
        let mut h = hydrator(HydrationConfig::default());
        let a = h.hydrate_node(&person(1, "Alice")).unwrap();
        let b = h.hydrate_node(&person(2, "Bob")).unwrap();
        let mut record = RelationshipRecord::new(10, 1, "KNOWS", 2);
        record.properties.insert("since".to_string(), json!(1999));

        let rel = h.hydrate_relationship(&record).unwrap();
        assert!(rel.start_node().ptr_eq(&a));
        assert!(rel.end_node().ptr_eq(&b));
        assert_eq!(rel.identity(), Some(10));
        assert_eq!(rel.get("since"), Some(PropertyValue::Integer(1999)));
        assert!(h.hydrate_relationship(&record).unwrap().ptr_eq(&rel));
    }

    #[test]
    fn test_missing_endpoint_fails_without_placeholders() {
        let mut h = hydrator(HydrationConfig::default());
        h.hydrate_node(&person(1, "Alice")).unwrap();
        let err = h.hydrate_relationship(&RelationshipRecord::new(10, 1, "KNOWS", 2)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert!(h.relationship(10).is_none());
        assert!(h.node(2).is_none());
    }

    #[test]
    fn test_placeholder_is_filled_later() {
        let mut h = hydrator(HydrationConfig {
            refresh_existing: false,
            placeholder_endpoints: true,
        });
        let rel = h.hydrate_relationship(&RelationshipRecord::new(10, 1, "KNOWS", 2)).unwrap();
        let placeholder = rel.end_node().clone();
        assert_eq!(placeholder.identity(), Some(2));
        assert!(placeholder.labels().is_empty());

        // Filled even with refresh disabled
        let bob = h.hydrate_node(&person(2, "Bob")).unwrap();
        assert!(bob.ptr_eq(&placeholder));
        assert!(placeholder.has_label("Person"));
    }

    #[test]
    fn test_conflicting_relationship_record() {
        let mut h = hydrator(HydrationConfig {
            placeholder_endpoints: true,
            ..HydrationConfig::default()
        });
        h.hydrate_relationship(&RelationshipRecord::new(10, 1, "KNOWS", 2)).unwrap();
        let err = h.hydrate_relationship(&RelationshipRecord::new(10, 1, "LIKES", 2)).unwrap_err();
        assert!(matches!(err, GraphError::Binding(_)));
        let err = h.hydrate_relationship(&RelationshipRecord::new(10, 2, "KNOWS", 1)).unwrap_err();
        assert!(matches!(err, GraphError::Binding(_)));
    }

    #[test]
    fn test_empty_type_and_negative_identity() {
        let mut h = hydrator(HydrationConfig {
            placeholder_endpoints: true,
            ..HydrationConfig::default()
        });
        assert!(h.hydrate_relationship(&RelationshipRecord::new(10, 1, "", 2)).is_err());
        assert!(matches!(h.hydrate_node(&NodeRecord::new(-1)), Err(GraphError::Binding(_))));
        assert!(h.hydrate_relationship(&RelationshipRecord::new(11, 1, "KNOWS", -2)).is_err());
        assert_eq!(h.subgraph().order(), 0);
    }

    #[test]
    fn test_hydrate_path() {
        let mut h = hydrator(HydrationConfig::default());
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), person(3, "Carol")],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                // Traversed backwards
                RelationshipRecord::new(11, 3, "KNOWS", 2),
            ],
        };
        let path = h.hydrate_path(&record).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.start_node().identity(), Some(1));
        assert_eq!(path.end_node().identity(), Some(3));
        assert!(path.nodes()[1].ptr_eq(h.node(2).unwrap()));
        assert_eq!(
            path.to_string(),
            "(_1:Person {name: 'Alice'})-[_10:KNOWS]->(_2:Person {name: 'Bob'})<-[_11:KNOWS]-(_3:Person {name: 'Carol'})"
        );
    }

    #[test]
    fn test_malformed_path_is_rejected_atomically() {
        let mut h = hydrator(HydrationConfig::default());
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), person(3, "Carol")],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                RelationshipRecord::new(11, 1, "KNOWS", 3),
            ],
        };
        assert!(h.hydrate_path(&record).is_err());
        assert!(h.subgraph().is_empty());

        let empty = PathRecord {
            nodes: vec![],
            relationships: vec![],
        };
        assert!(h.hydrate_path(&empty).is_err());
    }

    #[test]
    fn test_conflicting_relationship_within_path() {
        let mut h = hydrator(HydrationConfig::default());
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), person(3, "Carol")],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                RelationshipRecord::new(10, 2, "KNOWS", 3),
            ],
        };
        let err = h.hydrate_path(&record).unwrap_err();
        assert!(matches!(err, GraphError::Binding(_)));
        assert!(h.subgraph().is_empty());
        assert!(h.relationship(10).is_none());
    }

    #[test]
    fn test_repeated_relationship_within_path() {
        // a -> b, then back to a along the same relationship
        let mut h = hydrator(HydrationConfig::default());
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), person(1, "Alice")],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                RelationshipRecord::new(10, 1, "KNOWS", 2),
            ],
        };
        let path = h.hydrate_path(&record).unwrap();
        assert_eq!(path.len(), 2);
        assert!(path.relationships()[0].ptr_eq(&path.relationships()[1]));
        assert!(path.start_node().ptr_eq(path.end_node()));
        assert_eq!(path.size(), 1);
    }

    #[test]
    fn test_repeated_node_with_different_labels_in_path() {
        let mut h = hydrator(HydrationConfig::default());
        let mut revisited = person(1, "Alice");
        revisited.labels = vec!["Employee".to_string()];
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), revisited],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                RelationshipRecord::new(11, 2, "KNOWS", 1),
            ],
        };
        let path = h.hydrate_path(&record).unwrap();
        let first = &path.nodes()[0];
        assert!(first.ptr_eq(&path.nodes()[2]));
        // The later record wins
        assert!(first.has_label("Employee"));
        assert!(!first.has_label("Person"));
        assert_eq!(path.order(), 2);
    }

    #[test]
    fn test_repeated_node_in_path_without_refresh() {
        let mut h = hydrator(HydrationConfig {
            refresh_existing: false,
            ..HydrationConfig::default()
        });
        let mut revisited = person(1, "Alice");
        revisited.labels = vec!["Employee".to_string()];
        let record = PathRecord {
            nodes: vec![person(1, "Alice"), person(2, "Bob"), revisited],
            relationships: vec![
                RelationshipRecord::new(10, 1, "KNOWS", 2),
                RelationshipRecord::new(11, 2, "KNOWS", 1),
            ],
        };
        let path = h.hydrate_path(&record).unwrap();
        assert!(path.start_node().has_label("Person"));
        assert!(!path.start_node().has_label("Employee"));
    }

    #[test]
    fn test_hydrate_records() {
        let mut h = hydrator(HydrationConfig::default());
        let rows = vec![
            json!({
                "a": {"identity": 1, "labels": ["Person"], "properties": {"name": "Alice"}},
                "r": {"identity": 10, "type": "KNOWS", "start": 1, "end": 2, "properties": {}},
                "count": 3
            }),
            json!({
                "p": {
                    "nodes": [
                        {"identity": 1, "labels": ["Person"]},
                        {"identity": 2, "labels": ["Person"]}
                    ],
                    "relationships": [{"identity": 10, "type": "KNOWS", "start": 1, "end": 2}]
                },
                "names": ["Alice", {"identity": 2}]
            }),
        ];
        // Node 2 only arrives with the second row
        let err = h.hydrate_records(&rows[..1]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));

        h.clear();
        let out = h.hydrate_records(&rows[1..]).unwrap();
        let path = out[0]["p"].as_path().unwrap();
        assert_eq!(path.size(), 1);
        match &out[0]["names"] {
            Hydrated::List(items) => {
                assert_eq!(items[0], Hydrated::Value(json!("Alice")));
                assert!(items[1].as_node().unwrap().ptr_eq(path.end_node()));
            }
            other => panic!("expected a list, got {:?}", other),
        }

        let out = h.hydrate_records(&rows[..1]).unwrap();
        assert_eq!(out[0]["count"], Hydrated::Value(json!(3)));
        let rel = out[0]["r"].as_relationship().unwrap();
        assert!(rel.ptr_eq(&path.relationships()[0]));
        assert!(out[0]["a"].as_node().unwrap().ptr_eq(path.start_node()));
    }

    #[test]
    fn test_row_must_be_object() {
        let mut h = hydrator(HydrationConfig::default());
        assert!(h.hydrate_records(&[json!([1, 2])]).is_err());
    }

    #[test]
    fn test_clear_forgets_batch() {
        let mut h = hydrator(HydrationConfig::default());
        let first = h.hydrate_node(&person(1, "Alice")).unwrap();
        h.clear();
        let second = h.hydrate_node(&person(1, "Alice")).unwrap();
        assert!(!first.ptr_eq(&second));
        // Still the same remote node
        assert_eq!(first, second);
    }
}
