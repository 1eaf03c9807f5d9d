use super::{Entity, EntityState, Node};
use crate::property::PropertyDict;
use neokit_common::{GraphError, PropertyValue, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type given to relationships created without a type or a kind.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "TO";

/// Converts a mixed-case name to an upper snake case relationship type:
/// `WorksWith` becomes `WORKS_WITH`.
///
/// An underscore goes before every uppercase letter that follows a lowercase
/// letter or a digit, then the whole string is uppercased.
pub fn relationship_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase() {
            if let Some(p) = prev {
                if p.is_lowercase() || p.is_ascii_digit() {
                    out.push('_');
                }
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out.to_uppercase()
}

/// A named kind of relationship, standing in for a relationship subclass.
///
/// The type defaults to [`relationship_case`] of `NAME`; setting `TYPE`
/// overrides it. Declare kinds with [`relationship_kind!`](crate::relationship_kind).
pub trait RelationshipKind {
    const NAME: &'static str;
    const TYPE: Option<&'static str> = None;

    fn rel_type() -> String {
        match Self::TYPE {
            Some(t) => t.to_string(),
            None => relationship_case(Self::NAME),
        }
    }
}

/// Declares a unit struct implementing [`RelationshipKind`].
///
/// ```
/// neokit_core::relationship_kind!(pub WorksWith);
/// neokit_core::relationship_kind!(pub Likes = "FANCIES");
///
/// use neokit_core::RelationshipKind;
/// assert_eq!(WorksWith::rel_type(), "WORKS_WITH");
/// assert_eq!(Likes::rel_type(), "FANCIES");
/// ```
#[macro_export]
macro_rules! relationship_kind {
    ($vis:vis $name:ident) => {
        $vis struct $name;

        impl $crate::RelationshipKind for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
    ($vis:vis $name:ident = $rel_type:literal) => {
        $vis struct $name;

        impl $crate::RelationshipKind for $name {
            const NAME: &'static str = stringify!($name);
            const TYPE: Option<&'static str> = Some($rel_type);
        }
    };
}

struct RelationshipInner {
    state: EntityState,
    start: Node,
    end: Node,
    rel_type: String,
}

/// A directed, typed edge between two nodes (possibly the same node).
///
/// Endpoints and type are fixed at construction. Two relationships are equal
/// when their start nodes, end nodes and types are equal; properties and
/// binding do not take part.
#[derive(Clone)]
pub struct Relationship(Arc<RelationshipInner>);

impl Relationship {
    fn build(start: &Node, rel_type: String, end: &Node) -> Self {
        Relationship(Arc::new(RelationshipInner {
            state: EntityState::with_properties(PropertyDict::new()),
            start: start.clone(),
            end: end.clone(),
            rel_type,
        }))
    }

    fn checked_type(rel_type: impl Into<String>) -> Result<String> {
        let rel_type = rel_type.into();
        if rel_type.trim().is_empty() {
            return Err(GraphError::invalid("relationship type must not be empty"));
        }
        Ok(rel_type)
    }

    /// `(start)-[:rel_type]->(end)`
    pub fn new(start: &Node, rel_type: impl Into<String>, end: &Node) -> Result<Self> {
        Ok(Self::build(start, Self::checked_type(rel_type)?, end))
    }

    /// `(start)-[:TO]->(end)`
    pub fn with_default_type(start: &Node, end: &Node) -> Self {
        Self::build(start, DEFAULT_RELATIONSHIP_TYPE.to_string(), end)
    }

    /// `(node)-[:rel_type]->(node)`
    pub fn self_loop(node: &Node, rel_type: impl Into<String>) -> Result<Self> {
        Self::new(node, rel_type, node)
    }

    /// `(node)-[:TO]->(node)`
    pub fn self_loop_default(node: &Node) -> Self {
        Self::with_default_type(node, node)
    }

    /// Typed by a [`RelationshipKind`].
    pub fn of<K: RelationshipKind>(start: &Node, end: &Node) -> Self {
        Self::build(start, K::rel_type(), end)
    }

    pub fn self_loop_of<K: RelationshipKind>(node: &Node) -> Self {
        Self::of::<K>(node, node)
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

    pub fn rel_type(&self) -> &str {
        &self.0.rel_type
    }

    pub fn start_node(&self) -> &Node {
        &self.0.start
    }

    pub fn end_node(&self) -> &Node {
        &self.0.end
    }

    pub fn endpoints(&self) -> (&Node, &Node) {
        (&self.0.start, &self.0.end)
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other_node(&self, node: &Node) -> Option<&Node> {
        if *node == self.0.start {
            Some(&self.0.end)
        } else if *node == self.0.end {
            Some(&self.0.start)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.0.start == self.0.end
    }

    pub fn ptr_eq(&self, other: &Relationship) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn replace_properties(&self, properties: PropertyDict) {
        self.0.state.replace_properties(properties);
    }

    /// The `[...]` part of the Cypher pattern.
    pub(crate) fn fmt_pattern(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if let Some(identity) = self.identity() {
            write!(f, "_{}", identity)?;
        }
        write!(f, ":{}", self.0.rel_type)?;
        let properties = self.properties();
        if !properties.is_empty() {
            write!(f, " {}", properties)?;
        }
        write!(f, "]")
    }
}

impl Entity for Relationship {
    fn state(&self) -> &EntityState {
        &self.0.state
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.start == other.0.start
                && self.0.end == other.0.end
                && self.0.rel_type == other.0.rel_type)
    }
}

impl Eq for Relationship {}

impl Hash for Relationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.start.hash(state);
        self.0.end.hash(state);
        self.0.rel_type.hash(state);
    }
}

impl fmt::Debug for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("binding", &self.binding())
            .field("start", &self.0.start)
            .field("type", &self.0.rel_type)
            .field("end", &self.0.end)
            .field("properties", &self.properties())
            .finish()
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-", self.0.start)?;
        self.fmt_pattern(f)?;
        write!(f, "->{}", self.0.end)
    }
}
