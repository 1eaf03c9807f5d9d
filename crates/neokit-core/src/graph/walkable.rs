use crate::entity::{Node, Relationship};
use crate::graph::subgraph::{GraphElementSet, Subgraph};
use indexmap::IndexSet;
use neokit_common::{GraphError, Result};
use std::borrow::Cow;
use std::fmt;
use std::ops::Add;

/// One step of a walk: a node or a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Node(Node),
    Relationship(Relationship),
}

impl PathElement {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            PathElement::Node(n) => Some(n),
            PathElement::Relationship(_) => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            PathElement::Relationship(r) => Some(r),
            PathElement::Node(_) => None,
        }
    }
}

/// A subgraph with a traversal order: node, relationship, node, ..., node.
///
/// Two views are exposed. The inherent [`Walkable::nodes`] and
/// [`Walkable::relationships`] are positional and repeat an element once per
/// visit. The [`GraphElementSet`] view, and [`Walkable::subgraph`], are
/// deduplicated sets.
///
/// Relationships may be traversed against their direction; the underlying
/// relationship is never altered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walkable {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    subgraph: Subgraph,
}

/// A walk hydrated from a query result.
pub type Path = Walkable;

fn connects(rel: &Relationship, from: &Node, to: &Node) -> bool {
    (rel.start_node() == from && rel.end_node() == to)
        || (rel.start_node() == to && rel.end_node() == from)
}

impl Walkable {
    /// `relationships[i]` must join `nodes[i]` and `nodes[i + 1]`, in either
    /// direction.
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(GraphError::invalid("a walk needs at least one node"));
        }
        if nodes.len() != relationships.len() + 1 {
            return Err(GraphError::invalid(format!(
                "a walk over {} relationships needs {} nodes, got {}",
                relationships.len(),
                relationships.len() + 1,
                nodes.len()
            )));
        }
        for (i, rel) in relationships.iter().enumerate() {
            if !connects(rel, &nodes[i], &nodes[i + 1]) {
                return Err(GraphError::invalid(format!(
                    "relationship {} does not join {} and {}",
                    rel,
                    nodes[i],
                    nodes[i + 1]
                )));
            }
        }
        Ok(Self::from_parts(nodes, relationships))
    }

    // Callers guarantee alternation and adjacency.
    fn from_parts(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Self {
        let subgraph = Subgraph::new(nodes.iter().cloned(), relationships.iter().cloned());
        Self {
            nodes,
            relationships,
            subgraph,
        }
    }

    pub fn start_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn end_node(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Nodes in visiting order, repeats included.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Relationships in traversal order, repeats included.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Number of relationship traversals.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// True for a single-node walk.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    /// Element `k` of the alternating sequence.
    fn element(&self, k: usize) -> PathElement {
        if k % 2 == 0 {
            PathElement::Node(self.nodes[k / 2].clone())
        } else {
            PathElement::Relationship(self.relationships[k / 2].clone())
        }
    }

    /// The alternating sequence, `2 * len() + 1` elements long.
    pub fn sequence(&self) -> impl Iterator<Item = PathElement> + '_ {
        (0..2 * self.len() + 1).map(move |k| self.element(k))
    }

    pub fn reversed(&self) -> Walkable {
        let mut nodes = self.nodes.clone();
        nodes.reverse();
        let mut relationships = self.relationships.clone();
        relationships.reverse();
        Self {
            nodes,
            relationships,
            subgraph: self.subgraph.clone(),
        }
    }

    /// Appends `other`, walked backwards if it ends rather than starts at
    /// this walk's end node. The shared node appears once.
    pub fn concatenate(&self, other: &Walkable) -> Result<Walkable> {
        let last = self.end_node();
        let other = if other.start_node() == last {
            Cow::Borrowed(other)
        } else if other.end_node() == last {
            Cow::Owned(other.reversed())
        } else {
            tracing::debug!("Rejected concatenation at {}", last);
            return Err(GraphError::IncompatibleEndpoints {
                left: last.to_string(),
                right: format!("{}..{}", other.start_node(), other.end_node()),
            });
        };

        let mut nodes = self.nodes.clone();
        nodes.extend(other.nodes[1..].iter().cloned());
        let mut relationships = self.relationships.clone();
        relationships.extend(other.relationships.iter().cloned());
        Ok(Self::from_parts(nodes, relationships))
    }

    /// Whether the `i`th traversal follows the relationship's direction.
    fn is_forward(&self, i: usize) -> bool {
        self.relationships[i].start_node() == &self.nodes[i]
    }
}

impl From<Node> for Walkable {
    fn from(node: Node) -> Self {
        Self::from_parts(vec![node], Vec::new())
    }
}

impl From<&Node> for Walkable {
    fn from(node: &Node) -> Self {
        Self::from(node.clone())
    }
}

impl From<Relationship> for Walkable {
    fn from(rel: Relationship) -> Self {
        let (start, end) = rel.endpoints();
        let nodes = vec![start.clone(), end.clone()];
        Self::from_parts(nodes, vec![rel])
    }
}

impl From<&Relationship> for Walkable {
    fn from(rel: &Relationship) -> Self {
        Self::from(rel.clone())
    }
}

impl GraphElementSet for Walkable {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>> {
        Cow::Borrowed(self.subgraph.nodes())
    }

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>> {
        Cow::Borrowed(self.subgraph.relationships())
    }

    fn to_subgraph(&self) -> Subgraph {
        self.subgraph.clone()
    }
}

impl<'a, 'b> Add<&'b Walkable> for &'a Walkable {
    type Output = Result<Walkable>;

    fn add(self, rhs: &'b Walkable) -> Result<Walkable> {
        self.concatenate(rhs)
    }
}

impl fmt::Display for Walkable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nodes[0])?;
        for (i, rel) in self.relationships.iter().enumerate() {
            if self.is_forward(i) {
                write!(f, "-")?;
                rel.fmt_pattern(f)?;
                write!(f, "->")?;
            } else {
                write!(f, "<-")?;
                rel.fmt_pattern(f)?;
                write!(f, "-")?;
            }
            write!(f, "{}", self.nodes[i + 1])?;
        }
        Ok(())
    }
}

/// Several walkables joined end to end, iterated lazily.
///
/// Compatibility is checked once, up front. Iteration borrows the inputs and
/// can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    // Each part, and whether it is walked backwards.
    parts: Vec<(&'a Walkable, bool)>,
}

/// Joins `walkables` in order, each one walked forwards or backwards to meet
/// the end of the previous one. No inputs gives an empty walk.
pub fn walk(walkables: &[Walkable]) -> Result<Walk<'_>> {
    let mut parts = Vec::with_capacity(walkables.len());
    let mut end: Option<&Node> = None;
    for w in walkables {
        let reversed = match end {
            None => false,
            Some(last) if w.start_node() == last => false,
            Some(last) if w.end_node() == last => true,
            Some(last) => {
                return Err(GraphError::IncompatibleEndpoints {
                    left: last.to_string(),
                    right: format!("{}..{}", w.start_node(), w.end_node()),
                });
            }
        };
        end = Some(if reversed { w.start_node() } else { w.end_node() });
        parts.push((w, reversed));
    }
    Ok(Walk { parts })
}

impl<'a> Walk<'a> {
    pub fn iter(&self) -> WalkIter<'_, 'a> {
        WalkIter {
            walk: self,
            part: 0,
            pos: 0,
        }
    }

    pub fn start_node(&self) -> Option<&'a Node> {
        self.parts
            .first()
            .map(|&(w, reversed)| if reversed { w.end_node() } else { w.start_node() })
    }

    pub fn end_node(&self) -> Option<&'a Node> {
        self.parts
            .last()
            .map(|&(w, reversed)| if reversed { w.start_node() } else { w.end_node() })
    }

    /// Total number of relationship traversals.
    pub fn len(&self) -> usize {
        self.parts.iter().map(|(w, _)| w.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Materializes the joined walk.
    pub fn to_walkable(&self) -> Option<Walkable> {
        if self.parts.is_empty() {
            return None;
        }
        let mut nodes = Vec::with_capacity(self.len() + 1);
        let mut relationships = Vec::with_capacity(self.len());
        for element in self.iter() {
            match element {
                PathElement::Node(n) => nodes.push(n),
                PathElement::Relationship(r) => relationships.push(r),
            }
        }
        Some(Walkable::from_parts(nodes, relationships))
    }
}

impl<'w, 'a> IntoIterator for &'w Walk<'a> {
    type Item = PathElement;
    type IntoIter = WalkIter<'w, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct WalkIter<'w, 'a> {
    walk: &'w Walk<'a>,
    part: usize,
    pos: usize,
}

impl<'w, 'a> Iterator for WalkIter<'w, 'a> {
    type Item = PathElement;

    fn next(&mut self) -> Option<PathElement> {
        loop {
            let &(w, reversed) = self.walk.parts.get(self.part)?;
            let n = 2 * w.len() + 1;
            if self.pos >= n {
                // Skip the first element of the next part: it is the
                // boundary node just yielded.
                self.part += 1;
                self.pos = 1;
                continue;
            }
            let k = if reversed { n - 1 - self.pos } else { self.pos };
            self.pos += 1;
            return Some(w.element(k));
        }
    }
}
