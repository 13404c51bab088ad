//! In-memory storage backend.
//!
//! One generic index maps every live id to its kind; one insertion-ordered map
//! per kind owns the resources. A resource therefore appears in the generic
//! index and in exactly one typed map. Removed ids are remembered so they are
//! never handed out again.
//!
//! Lookups, inserts and overwrites are O(1). Removing a resource (or moving it
//! to another kind) uses `shift_remove`, which is linear in the size of that
//! kind's map: the typed view must keep insertion order for pagination
//! tokens to stay stable, and `swap_remove` would reorder it.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::StorageError;
use crate::id::{AccountId, IdAllocator, ResourceId};
use crate::resource::{Resource, ResourceKind};

use super::snapshot::StoreSnapshot;
use super::traits::{ResourceMut, ResourceStore, TypedView};

/// In-memory resource store for one simulated account.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    account_id: AccountId,
    ids: IdAllocator,
    by_id: HashMap<ResourceId, ResourceKind>,
    by_kind: HashMap<ResourceKind, IndexMap<ResourceId, Resource>>,
    retired: HashSet<ResourceId>,
}

impl InMemoryResourceStore {
    /// Create a new empty store for the default account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store for `account_id`.
    #[must_use]
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id,
            ..Self::default()
        }
    }

    /// Replace the id allocator (e.g. with a seeded one).
    #[must_use]
    pub fn with_allocator(mut self, ids: IdAllocator) -> Self {
        self.ids = ids;
        self
    }

    /// Rebuild a store from a snapshot, preserving per-kind order.
    ///
    /// # Errors
    /// - `RetiredId`: the snapshot lists a live resource under a retired id
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StorageError> {
        let mut store = Self::for_account(snapshot.account_id);
        store.retired = snapshot.retired.into_iter().collect();
        for resource in snapshot.resources {
            store.put(resource)?;
        }
        Ok(store)
    }

    /// Kinds that currently hold at least one resource, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = self
            .by_kind
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        kinds.sort();
        kinds
    }

    /// Returns true if `id` belonged to a removed resource.
    #[must_use]
    pub fn is_retired(&self, id: &str) -> bool {
        self.retired.contains(id)
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn put(&mut self, resource: Resource) -> Result<Option<Resource>, StorageError> {
        let id = resource.id().clone();
        if self.retired.contains(&id) {
            return Err(StorageError::RetiredId(id));
        }

        let kind = resource.kind().clone();
        trace!(%id, %kind, "store.put");

        if let Some(prev_kind) = self.by_id.insert(id.clone(), kind.clone()) {
            if prev_kind != kind {
                // Kind changed: move to the tail of the new kind's order.
                let prev = self
                    .by_kind
                    .get_mut(&prev_kind)
                    .and_then(|m| m.shift_remove(&id));
                self.by_kind.entry(kind).or_default().insert(id, resource);
                return Ok(prev);
            }
        }

        // Overwrite keeps the original insertion position.
        Ok(self.by_kind.entry(kind).or_default().insert(id, resource))
    }

    fn get(&self, id: &str) -> Option<&Resource> {
        let kind = self.by_id.get(id)?;
        self.by_kind.get(kind)?.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<ResourceMut<'_>> {
        let kind = self.by_id.get(id)?;
        self.by_kind
            .get_mut(kind)?
            .get_mut(id)
            .map(ResourceMut::new)
    }

    fn get_typed(&self, kind: &ResourceKind) -> TypedView<'_> {
        TypedView::new(self.by_kind.get(kind))
    }

    fn remove(&mut self, id: &str) -> Option<Resource> {
        let (id, kind) = self.by_id.remove_entry(id)?;
        trace!(%id, %kind, "store.remove");
        let removed = self
            .by_kind
            .get_mut(&kind)
            .and_then(|m| m.shift_remove(id.as_str()));
        self.retired.insert(id);
        removed
    }

    fn fresh_id(&mut self, kind: &ResourceKind) -> ResourceId {
        loop {
            let id = self.ids.allocate(kind.id_prefix());
            if !self.by_id.contains_key(&id) && !self.retired.contains(&id) {
                return id;
            }
        }
    }

    fn len(&self) -> usize {
        self.by_id.len()
    }

    fn snapshot(&self) -> StoreSnapshot {
        let mut resources = Vec::with_capacity(self.by_id.len());
        for kind in self.kinds() {
            resources.extend(self.get_typed(&kind).iter().cloned());
        }
        let mut retired: Vec<ResourceId> = self.retired.iter().cloned().collect();
        retired.sort();
        StoreSnapshot {
            account_id: self.account_id.clone(),
            resources,
            retired,
        }
    }
}
