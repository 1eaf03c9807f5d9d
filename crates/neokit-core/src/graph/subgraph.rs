use crate::entity::{Entity, Node, Relationship};
use crate::graph::walkable::Walkable;
use indexmap::IndexSet;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::{BitAnd, BitOr, BitXor, Sub};

/// Anything that can be viewed as a set of nodes and relationships.
///
/// A node is a subgraph of one node and no relationships, a relationship is
/// its two endpoints plus itself. The set algebra below works against this
/// trait only, so every combination of element kinds composes.
pub trait GraphElementSet {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>>;

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>>;

    fn to_subgraph(&self) -> Subgraph {
        Subgraph {
            nodes: self.nodes().into_owned(),
            relationships: self.relationships().into_owned(),
        }
    }

    /// Union of all node labels.
    fn labels(&self) -> BTreeSet<String> {
        self.nodes().iter().flat_map(|n| n.labels()).collect()
    }

    /// Union of all relationship types.
    fn types(&self) -> BTreeSet<String> {
        self.relationships()
            .iter()
            .map(|r| r.rel_type().to_string())
            .collect()
    }

    /// Union of property keys over every node and relationship.
    fn keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for node in self.nodes().iter() {
            keys.extend(node.properties().keys().cloned());
        }
        for rel in self.relationships().iter() {
            keys.extend(rel.properties().keys().cloned());
        }
        keys
    }

    /// Number of nodes.
    fn order(&self) -> usize {
        self.nodes().len()
    }

    /// Number of relationships.
    fn size(&self) -> usize {
        self.relationships().len()
    }
}

impl<T: GraphElementSet + ?Sized> GraphElementSet for &T {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>> {
        (**self).nodes()
    }

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>> {
        (**self).relationships()
    }
}

impl GraphElementSet for Node {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>> {
        Cow::Owned(IndexSet::from([self.clone()]))
    }

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>> {
        Cow::Owned(IndexSet::new())
    }
}

impl GraphElementSet for Relationship {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>> {
        let (start, end) = self.endpoints();
        let mut nodes = IndexSet::with_capacity(2);
        nodes.insert(start.clone());
        nodes.insert(end.clone());
        Cow::Owned(nodes)
    }

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>> {
        Cow::Owned(IndexSet::from([self.clone()]))
    }
}

/// An immutable set of nodes and relationships in which every relationship's
/// endpoints are also members of the node set.
///
/// A subgraph with no nodes is the empty subgraph. Iteration follows
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    nodes: IndexSet<Node>,
    relationships: IndexSet<Relationship>,
}

impl Subgraph {
    /// Builds a subgraph, adding the endpoints of every relationship to the
    /// node set.
    pub fn new<N, R>(nodes: N, relationships: R) -> Self
    where
        N: IntoIterator<Item = Node>,
        R: IntoIterator<Item = Relationship>,
    {
        let relationships: IndexSet<Relationship> = relationships.into_iter().collect();
        let mut nodes: IndexSet<Node> = nodes.into_iter().collect();
        nodes.extend(endpoints(&relationships));
        Self { nodes, relationships }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &IndexSet<Node> {
        &self.nodes
    }

    pub fn relationships(&self) -> &IndexSet<Relationship> {
        &self.relationships
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_relationship(&self, rel: &Relationship) -> bool {
        self.relationships.contains(rel)
    }
}

impl GraphElementSet for Subgraph {
    fn nodes(&self) -> Cow<'_, IndexSet<Node>> {
        Cow::Borrowed(&self.nodes)
    }

    fn relationships(&self) -> Cow<'_, IndexSet<Relationship>> {
        Cow::Borrowed(&self.relationships)
    }

    fn to_subgraph(&self) -> Subgraph {
        self.clone()
    }
}

fn endpoints<'a, I>(relationships: I) -> impl Iterator<Item = Node> + 'a
where
    I: IntoIterator<Item = &'a Relationship>,
    I::IntoIter: 'a,
{
    relationships.into_iter().flat_map(|r| {
        let (start, end) = r.endpoints();
        [start.clone(), end.clone()]
    })
}

/// Nodes and relationships of both operands.
pub fn union(a: &impl GraphElementSet, b: &impl GraphElementSet) -> Subgraph {
    let mut nodes = a.nodes().into_owned();
    nodes.extend(b.nodes().iter().cloned());
    let mut relationships = a.relationships().into_owned();
    relationships.extend(b.relationships().iter().cloned());
    Subgraph { nodes, relationships }
}

/// Nodes common to both and relationships common to both, intersected
/// independently. A shared relationship has its endpoints in both node sets,
/// so closure holds.
pub fn intersection(a: &impl GraphElementSet, b: &impl GraphElementSet) -> Subgraph {
    let (a_nodes, a_rels) = (a.nodes(), a.relationships());
    let (b_nodes, b_rels) = (b.nodes(), b.relationships());
    let nodes: IndexSet<Node> = a_nodes.intersection(&*b_nodes).cloned().collect();
    let relationships: IndexSet<Relationship> =
        a_rels.intersection(&*b_rels).cloned().collect();
    Subgraph { nodes, relationships }
}

/// Relationships of `a` not in `b`; nodes of `a` not in `b` plus every
/// endpoint of a surviving relationship, even one that `b` contains.
pub fn difference(a: &impl GraphElementSet, b: &impl GraphElementSet) -> Subgraph {
    let (a_nodes, a_rels) = (a.nodes(), a.relationships());
    let (b_nodes, b_rels) = (b.nodes(), b.relationships());
    let relationships: IndexSet<Relationship> =
        a_rels.difference(&*b_rels).cloned().collect();
    let mut nodes: IndexSet<Node> = a_nodes.difference(&*b_nodes).cloned().collect();
    nodes.extend(endpoints(&relationships));
    Subgraph { nodes, relationships }
}

/// Relationships in exactly one operand; nodes in exactly one operand plus
/// every endpoint of a surviving relationship.
pub fn symmetric_difference(a: &impl GraphElementSet, b: &impl GraphElementSet) -> Subgraph {
    let (a_nodes, a_rels) = (a.nodes(), a.relationships());
    let (b_nodes, b_rels) = (b.nodes(), b.relationships());
    let relationships: IndexSet<Relationship> =
        a_rels.symmetric_difference(&*b_rels).cloned().collect();
    let mut nodes: IndexSet<Node> = a_nodes.symmetric_difference(&*b_nodes).cloned().collect();
    nodes.extend(endpoints(&relationships));
    Subgraph { nodes, relationships }
}

/// Union of any number of operands; the empty subgraph when there are none.
pub fn union_all<I>(items: I) -> Subgraph
where
    I: IntoIterator,
    I::Item: GraphElementSet,
{
    items
        .into_iter()
        .fold(Subgraph::empty(), |acc, item| union(&acc, &item))
}

pub fn order(graph: &impl GraphElementSet) -> usize {
    graph.order()
}

pub fn size(graph: &impl GraphElementSet) -> usize {
    graph.size()
}

macro_rules! impl_set_operators {
    (@rhs $lhs:ty; $($rhs:ty),*) => {
        $(
            impl<'a, 'b> BitOr<&'b $rhs> for &'a $lhs {
                type Output = Subgraph;

                fn bitor(self, rhs: &'b $rhs) -> Subgraph {
                    union(self, rhs)
                }
            }

            impl<'a, 'b> BitAnd<&'b $rhs> for &'a $lhs {
                type Output = Subgraph;

                fn bitand(self, rhs: &'b $rhs) -> Subgraph {
                    intersection(self, rhs)
                }
            }

            impl<'a, 'b> Sub<&'b $rhs> for &'a $lhs {
                type Output = Subgraph;

                fn sub(self, rhs: &'b $rhs) -> Subgraph {
                    difference(self, rhs)
                }
            }

            impl<'a, 'b> BitXor<&'b $rhs> for &'a $lhs {
                type Output = Subgraph;

                fn bitxor(self, rhs: &'b $rhs) -> Subgraph {
                    symmetric_difference(self, rhs)
                }
            }
        )*
    };
    ($($lhs:ty),*) => {
        $( impl_set_operators!(@rhs $lhs; Subgraph, Node, Relationship, Walkable); )*
    };
}

impl_set_operators!(Subgraph, Node, Relationship, Walkable);
