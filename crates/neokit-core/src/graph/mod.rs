// Graph Structure Module Exports
//
// Subgraphs are unordered element sets with set algebra; walkables add a
// traversal order on top. Projection hands either one to petgraph.

pub mod subgraph;
pub mod walkable;
pub mod projection;

pub use subgraph::{
    difference, intersection, order, size, symmetric_difference, union, union_all,
    GraphElementSet, Subgraph,
};
pub use walkable::{walk, Path, PathElement, Walk, WalkIter, Walkable};
pub use projection::Projection;
