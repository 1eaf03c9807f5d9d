pub mod entity;
pub mod property;
pub mod graph;
pub mod hydrate;
pub mod export;

pub use entity::{
    relationship_case, Entity, Node, Relationship, RelationshipKind, DEFAULT_RELATIONSHIP_TYPE,
};
pub use property::PropertyDict;
pub use graph::{
    difference, intersection, order, size, symmetric_difference, union, union_all, walk,
    GraphElementSet, Path, PathElement, Projection, Subgraph, Walk, Walkable,
};
pub use hydrate::{Hydrated, Hydrator, Row};
pub use export::{NodeData, RelationshipData, SubgraphData};

// Re-export common types for convenience
pub use neokit_common::{
    Binding, GraphError, GraphRef, NodeRecord, PathRecord, PropertyValue, RelationshipRecord,
    Result,
};
pub use neokit_common::config::{HydrationConfig, ModelConfig};
