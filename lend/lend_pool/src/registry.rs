//! Identifier to resource lookup table.
//!
//! The registry is filled once while the pool is built and is only read
//! afterwards; the pool holds it behind a shared reference.

use crate::error::{PoolError, Result};
use crate::id::ResourceId;
use crate::resource::Resource;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from resource identifier to resource
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: HashMap<ResourceId, Arc<Resource>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite the entry for `id`.
    ///
    /// Returns the resource previously registered under `id`, if any.
    pub fn register(&mut self, id: ResourceId, resource: Arc<Resource>) -> Option<Arc<Resource>> {
        self.entries.insert(id, resource)
    }

    /// Look up the resource registered under `id`.
    pub fn get(&self, id: &ResourceId) -> Result<&Arc<Resource>> {
        self.entries
            .get(id)
            .ok_or_else(|| PoolError::UnknownResource(id.clone()))
    }

    /// Whether a resource is registered under `id`.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the registered identifiers in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.entries.keys()
    }
}
