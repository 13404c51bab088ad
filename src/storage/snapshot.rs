//! Serializable store snapshots.
//!
//! The store keeps nothing across process restarts on its own. Callers that
//! want durability capture a [`StoreSnapshot`] and write it out explicitly.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::id::{AccountId, ResourceId};
use crate::resource::Resource;

/// Point-in-time copy of a store.
///
/// Resources are grouped by kind (kinds sorted) and keep their per-kind
/// insertion order, so restoring reproduces identical query pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Owning account of the captured store.
    pub account_id: AccountId,
    /// Live resources.
    pub resources: Vec<Resource>,
    /// Ids of removed resources, sorted.
    pub retired: Vec<ResourceId>,
}

impl StoreSnapshot {
    /// Write the snapshot as pretty JSON.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a snapshot written by [`StoreSnapshot::save_to`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Number of live resources captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no live resources were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
