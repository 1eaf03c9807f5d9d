use super::{read, write, Entity, EntityState};
use crate::property::PropertyDict;
use neokit_common::PropertyValue;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

struct NodeInner {
    state: EntityState,
    labels: RwLock<BTreeSet<String>>,
}

/// A graph node: a label set plus properties, optionally bound to a remote
/// graph.
///
/// Equality has two modes. An unbound node equals only itself (or a clone of
/// the same handle). A bound node equals any node bound to the same
/// (graph, identity) pair, whatever its local labels and properties. A bound
/// node never equals an unbound one.
///
/// Binding changes the hash, so bind before placing a node in a set.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_state(labels.into_iter().map(Into::into).collect(), PropertyDict::new())
    }

    pub(crate) fn with_state(labels: BTreeSet<String>, properties: PropertyDict) -> Self {
        Node(Arc::new(NodeInner {
            state: EntityState::with_properties(properties),
            labels: RwLock::new(labels),
        }))
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.add_label(label);
        self
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_properties<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.update(entries);
        self
    }

    /// True when both handles point at the same object.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Snapshot of the current labels.
    pub fn labels(&self) -> BTreeSet<String> {
        read(&self.0.labels).clone()
    }

    pub fn has_label(&self, label: &str) -> bool {
        read(&self.0.labels).contains(label)
    }

    /// Returns false if the label was already present.
    pub fn add_label(&self, label: impl Into<String>) -> bool {
        write(&self.0.labels).insert(label.into())
    }

    /// Removing an absent label is a no-op; returns whether it was present.
    pub fn remove_label(&self, label: &str) -> bool {
        write(&self.0.labels).remove(label)
    }

    pub fn clear_labels(&self) {
        write(&self.0.labels).clear();
    }

    pub fn update_labels<I, S>(&self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        write(&self.0.labels).extend(labels);
    }

    /// Replaces labels and properties wholesale, as when a fresher record for
    /// the same remote node arrives.
    pub(crate) fn replace_state(&self, labels: BTreeSet<String>, properties: PropertyDict) {
        *write(&self.0.labels) = labels;
        self.0.state.replace_properties(properties);
    }
}

impl Entity for Node {
    fn state(&self) -> &EntityState {
        &self.0.state
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new(Vec::<String>::new())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.binding(), other.binding()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.binding() {
            Some(binding) => {
                1u8.hash(state);
                binding.hash(state);
            }
            None => {
                0u8.hash(state);
                (Arc::as_ptr(&self.0) as usize).hash(state);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("binding", &self.binding())
            .field("labels", &self.labels())
            .field("properties", &self.properties())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        if let Some(identity) = self.identity() {
            write!(f, "_{}", identity)?;
        }
        for label in read(&self.0.labels).iter() {
            write!(f, ":{}", label)?;
        }
        let properties = self.properties();
        if !properties.is_empty() {
            write!(f, " {}", properties)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neokit_common::{GraphError, GraphRef};
    use std::collections::HashSet;

    fn person(name: &str) -> Node {
        Node::new(["Person"]).with_property("name", name)
    }

    #[test]
    fn test_unbound_nodes_use_identity() {
        let a = person("Alice");
        let b = person("Alice");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_bound_nodes_compare_by_binding() {
        let graph = GraphRef::new("bolt://localhost:7687");
        let a = person("Alice");
        let b = person("Alice");
        a.bind(graph.clone(), 5).unwrap();
        b.bind(graph.clone(), 5).unwrap();
        assert_eq!(a, b);

        // Local differences do not matter once bound
        b.set("name", "Bob");
        b.add_label("Employee");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
    }

    #[test]
    fn test_bound_never_equals_unbound() {
        let a = person("Alice");
        let b = person("Alice");
        a.bind(GraphRef::new("bolt://localhost:7687"), 1).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, a);
    }

    #[test]
    fn test_same_identity_different_graph() {
        let a = Node::default();
        let b = Node::default();
        a.bind(GraphRef::new("bolt://one:7687"), 9).unwrap();
        b.bind(GraphRef::new("bolt://two:7687"), 9).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rebind_is_rejected() {
        let graph = GraphRef::new("bolt://localhost:7687");
        let a = Node::default();
        a.bind(graph.clone(), 1).unwrap();
        assert!(matches!(a.bind(graph.clone(), 1), Err(GraphError::Binding(_))));
        assert!(matches!(a.bind(graph.clone(), 2), Err(GraphError::Binding(_))));
        assert_eq!(a.identity(), Some(1));

        let previous = a.unbind().unwrap();
        assert_eq!(previous.identity, 1);
        assert!(!a.is_bound());
        a.bind(graph, 2).unwrap();
        assert_eq!(a.identity(), Some(2));
    }

    #[test]
    fn test_label_set_semantics() {
        let node = Node::new(["Person", "Person"]);
        assert_eq!(node.labels().len(), 1);
        assert!(!node.add_label("Person"));
        assert!(node.add_label("Employee"));
        assert!(node.remove_label("Employee"));
        assert!(!node.remove_label("Employee"));
        node.update_labels(["A", "B"]);
        assert!(node.has_label("A") && node.has_label("B") && node.has_label("Person"));
        node.clear_labels();
        assert!(node.labels().is_empty());
    }

    #[test]
    fn test_properties_delegate_to_dict() {
        let node = person("Alice").with_property("age", 33i64);
        assert_eq!(node.get("age"), Some(PropertyValue::Integer(33)));
        assert_eq!(node.get("missing"), None);

        node.update([("age", PropertyValue::Null), ("city", "Lund".into())]);
        assert!(!node.contains_key("age"));
        assert_eq!(node.remove("missing"), None);
        assert_eq!(node.properties().len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let a = person("Alice");
        let alias = a.clone();
        alias.set("age", 40i64);
        alias.add_label("Admin");
        assert_eq!(a.get("age"), Some(PropertyValue::Integer(40)));
        assert!(a.has_label("Admin"));
    }

    #[test]
    fn test_display() {
        let node = person("Alice").with_label("Admin");
        assert_eq!(node.to_string(), "(:Admin:Person {name: 'Alice'})");

        node.bind(GraphRef::new("bolt://localhost:7687"), 5).unwrap();
        assert_eq!(node.to_string(), "(_5:Admin:Person {name: 'Alice'})");
        assert_eq!(Node::default().to_string(), "()");
    }
}
