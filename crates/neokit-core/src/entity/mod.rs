// Graph entities: nodes and relationships.
//
// Both are cheap-to-clone handles over shared state. A clone is the same
// object: it sees the same mutations and compares by the same identity.

mod node;
mod relationship;

pub use node::Node;
pub use relationship::{relationship_case, Relationship, RelationshipKind, DEFAULT_RELATIONSHIP_TYPE};

use crate::property::PropertyDict;
use neokit_common::{Binding, GraphError, GraphRef, PropertyValue, Result};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// A panic while holding one of these locks cannot leave the data half
// written, so poisoning is ignored.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Binding and property state shared by every entity kind.
#[derive(Debug, Default)]
pub struct EntityState {
    binding: RwLock<Option<Binding>>,
    properties: RwLock<PropertyDict>,
}

impl EntityState {
    pub(crate) fn with_properties(properties: PropertyDict) -> Self {
        Self {
            binding: RwLock::new(None),
            properties: RwLock::new(properties),
        }
    }

    pub(crate) fn replace_properties(&self, properties: PropertyDict) {
        *write(&self.properties) = properties;
    }
}

/// Binding and property access for nodes and relationships.
///
/// Property methods follow [`PropertyDict`] exactly: `get` never fails,
/// `set` with `Null` deletes, removing an absent key is a no-op.
pub trait Entity {
    #[doc(hidden)]
    fn state(&self) -> &EntityState;

    fn binding(&self) -> Option<Binding> {
        read(&self.state().binding).clone()
    }

    fn identity(&self) -> Option<i64> {
        read(&self.state().binding).as_ref().map(|b| b.identity)
    }

    fn graph(&self) -> Option<GraphRef> {
        read(&self.state().binding).as_ref().map(|b| b.graph.clone())
    }

    fn is_bound(&self) -> bool {
        read(&self.state().binding).is_some()
    }

    /// Binds the entity to a remote (graph, identity) pair. An entity is
    /// bound at most once; call [`Entity::unbind`] first to move it.
    fn bind(&self, graph: GraphRef, identity: i64) -> Result<()> {
        let binding = Binding::new(graph, identity)?;
        let mut slot = write(&self.state().binding);
        if let Some(existing) = slot.as_ref() {
            return Err(GraphError::Binding(format!(
                "entity is already bound to {}; refusing to rebind to {}",
                existing, binding
            )));
        }
        tracing::debug!("Bound entity to {}", binding);
        *slot = Some(binding);
        Ok(())
    }

    /// Clears the binding, returning the previous one.
    fn unbind(&self) -> Option<Binding> {
        let previous = write(&self.state().binding).take();
        if let Some(b) = &previous {
            tracing::debug!("Unbound entity from {}", b);
        }
        previous
    }

    fn get(&self, key: &str) -> Option<PropertyValue> {
        read(&self.state().properties).get(key).cloned()
    }

    fn set(&self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        write(&self.state().properties).set(key, value);
    }

    fn remove(&self, key: &str) -> Option<PropertyValue> {
        write(&self.state().properties).remove(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        read(&self.state().properties).contains_key(key)
    }

    fn update<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        // Converted before locking: the source may read this same entity.
        let entries: Vec<(String, PropertyValue)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        write(&self.state().properties).update(entries);
    }

    fn update_from_json(&self, source: &serde_json::Value) -> Result<()> {
        write(&self.state().properties).update_from_json(source)
    }

    fn clear_properties(&self) {
        write(&self.state().properties).clear();
    }

    /// Snapshot of the current local properties.
    fn properties(&self) -> PropertyDict {
        read(&self.state().properties).clone()
    }
}
