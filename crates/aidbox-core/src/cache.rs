//! Optional resource cache keyed by `(resourceType, id)`.
//!
//! The client consults it when resolving local references and invalidates
//! entries on save and delete. Nothing in the document model depends on it.

use dashmap::DashMap;
use tracing::trace;

use crate::node::Node;

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: DashMap<(String, String), Node>,
}

impl ResourceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<Node> {
        let hit = self
            .entries
            .get(&(resource_type.to_string(), id.to_string()))
            .map(|entry| entry.value().clone());
        trace!(resource_type = %resource_type, id = %id, hit = hit.is_some(), "resource cache lookup");
        hit
    }

    /// Stores a resource under its own type and id; nodes without either are
    /// ignored.
    pub fn insert(&self, node: &Node) {
        if let (Some(resource_type), Some(id)) = (node.resource_type(), node.id()) {
            self.entries
                .insert((resource_type.to_string(), id.to_string()), node.clone());
        }
    }

    pub fn invalidate(&self, resource_type: &str, id: &str) {
        if self
            .entries
            .remove(&(resource_type.to_string(), id.to_string()))
            .is_some()
        {
            trace!(resource_type = %resource_type, id = %id, "resource cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
