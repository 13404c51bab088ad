//! Shared, lock-guarded store handle.
//!
//! The store is the only shared mutable state in the core. One mutex guards
//! it and is held for an entire handler invocation, so multi-kind
//! read-modify-write sequences (e.g. terminating an instance and detaching its
//! volumes) never interleave with another request.
//!
//! A handler that panics while holding the lock poisons the mutex. The store
//! is recovered on the next acquisition, so later requests keep working.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use super::memory::InMemoryResourceStore;
use super::traits::ResourceStore;

/// Guard giving exclusive access to the store.
pub type StoreGuard<'a> = MutexGuard<'a, Box<dyn ResourceStore>>;

/// Cloneable handle to one store instance.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Box<dyn ResourceStore>>>,
}

impl SharedStore {
    /// Wrap a store backend.
    #[must_use]
    pub fn new(store: impl ResourceStore + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    /// Take the store lock, recovering it if a previous holder panicked.
    ///
    /// Writes a panicking handler finished before unwinding stay applied.
    pub fn lock(&self) -> StoreGuard<'_> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("resource store lock poisoned by a panicking handler; recovering");
            self.inner.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn ResourceStore) -> R) -> R {
        let mut guard = self.lock();
        f(&mut **guard)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(InMemoryResourceStore::new())
    }
}

impl fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStore")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::id::ResourceId;
    use crate::resource::{Resource, ResourceKind};

    #[test]
    fn test_with_runs_under_lock() {
        let store = SharedStore::default();
        let len = store
            .with(|s| {
                let r = Resource::builder(ResourceKind::Custom("widget".to_string()))
                    .id(ResourceId::new("widget-1"))
                    .owner(s.account_id().clone())
                    .build()
                    .unwrap();
                s.put(r).unwrap();
                s.len()
            });
        assert_eq!(len, 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let store = SharedStore::default();
        let poisoner = store.clone();
        let joined = thread::spawn(move || {
            poisoner.with(|s| {
                let r = Resource::builder(ResourceKind::Custom("widget".to_string()))
                    .id(ResourceId::new("widget-1"))
                    .owner(s.account_id().clone())
                    .build()
                    .unwrap();
                s.put(r).unwrap();
                panic!("handler panicked");
            })
        })
        .join();
        assert!(joined.is_err());

        assert_eq!(store.with(|s| s.len()), 1);
        assert!(!store.inner.is_poisoned());
    }
}
