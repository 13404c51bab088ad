//! Abstract store trait for simulated resources.
//!
//! The store is deliberately not internally synchronized: every method takes
//! `&self`/`&mut self` and callers share it through [`super::SharedStore`], whose
//! single lock is held for a whole handler invocation. This lets handlers run
//! read-modify-write sequences across resource kinds without interleaving.

use indexmap::IndexMap;

use crate::error::StorageError;
use crate::id::{AccountId, ResourceId};
use crate::resource::{Resource, ResourceKind};
use crate::value::Value;

use super::snapshot::StoreSnapshot;

/// Live, insertion-ordered view of every resource of one kind.
#[derive(Debug, Clone, Copy)]
pub struct TypedView<'a> {
    entries: Option<&'a IndexMap<ResourceId, Resource>>,
}

impl<'a> TypedView<'a> {
    pub(crate) const fn new(entries: Option<&'a IndexMap<ResourceId, Resource>>) -> Self {
        Self { entries }
    }

    /// Iterates resources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Resource> + 'a {
        self.entries.into_iter().flat_map(|m| m.values())
    }

    /// Number of resources of this kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.map_or(0, |m| m.len())
    }

    /// Returns true if no resource of this kind exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a resource of this kind by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Resource> {
        self.entries.and_then(|m| m.get(id))
    }
}

impl<'a> IntoIterator for TypedView<'a> {
    type Item = &'a Resource;
    type IntoIter = Box<dyn Iterator<Item = &'a Resource> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.entries.into_iter().flat_map(|m| m.values()))
    }
}

/// Mutable handle to a stored resource.
///
/// Only attributes and tags can change through it; id and kind stay fixed so
/// both store indices remain consistent.
#[derive(Debug)]
pub struct ResourceMut<'a>(&'a mut Resource);

impl<'a> ResourceMut<'a> {
    pub(crate) fn new(resource: &'a mut Resource) -> Self {
        Self(resource)
    }

    /// Sets an attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.set_attribute(name, value)
    }

    /// Removes an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.0.remove_attribute(name)
    }

    /// Sets a tag, returning the previous value.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.set_tag(key, value)
    }

    /// Removes a tag, returning its value.
    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.0.remove_tag(key)
    }
}

impl std::ops::Deref for ResourceMut<'_> {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        self.0
    }
}

/// Storage trait for simulated resources.
///
/// Absence is never an error: lookups return `None` and `remove` of an unknown
/// id is a no-op. Handlers turn `None` into a typed NotFound naming the kind.
pub trait ResourceStore: Send {
    /// The simulated account that owns this store's resources.
    fn account_id(&self) -> &AccountId;

    /// Insert or overwrite by id, returning the previous resource.
    ///
    /// # Errors
    /// - `RetiredId`: the id belonged to a resource removed earlier
    fn put(&mut self, resource: Resource) -> Result<Option<Resource>, StorageError>;

    /// Get a resource by id.
    fn get(&self, id: &str) -> Option<&Resource>;

    /// Get a resource by id for in-place modification of its attributes and tags.
    fn get_mut(&mut self, id: &str) -> Option<ResourceMut<'_>>;

    /// Live view of all resources of a kind, in insertion order.
    fn get_typed(&self, kind: &ResourceKind) -> TypedView<'_>;

    /// Delete from both indices. Unknown ids are a no-op.
    fn remove(&mut self, id: &str) -> Option<Resource>;

    /// Resolve an id one resource holds for another.
    fn resolve_cross_reference(&self, id: &str) -> Option<&Resource> {
        self.get(id)
    }

    /// Allocate an id for `kind` that is neither live nor retired.
    fn fresh_id(&mut self, kind: &ResourceKind) -> ResourceId;

    /// Total number of live resources.
    fn len(&self) -> usize;

    /// Returns true if the store holds no resources.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `id` is live.
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Capture every live resource and retired id.
    fn snapshot(&self) -> StoreSnapshot;
}
