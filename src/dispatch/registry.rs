//! Action name to handler registrations.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::handler::ActionHandler;

/// Lifecycle of one action name within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// No handler under this name.
    Unregistered,
    /// Handler present, never dispatched.
    Registered,
    /// Registered and dispatched at least once.
    Invoked(u64),
}

struct Registration {
    handler: Arc<dyn ActionHandler>,
    invocations: AtomicU64,
}

/// Handlers keyed by action name; names are unique, re-registering replaces.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Registration>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, returning the handler it replaced.
    ///
    /// Replacing a handler resets the action to `Registered`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl ActionHandler + 'static,
    ) -> Option<Arc<dyn ActionHandler>> {
        self.register_arc(name, Arc::new(handler))
    }

    /// Registers an already shared handler.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Option<Arc<dyn ActionHandler>> {
        self.actions
            .insert(
                name.into(),
                Registration {
                    handler,
                    invocations: AtomicU64::new(0),
                },
            )
            .map(|prev| prev.handler)
    }

    /// Removes a registration.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.actions.remove(name).map(|r| r.handler)
    }

    /// Handler registered under `name`, without counting an invocation.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.actions.get(name).map(|r| Arc::clone(&r.handler))
    }

    /// Looks up a handler and counts the invocation.
    pub(crate) fn checkout(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        let registration = self.actions.get(name)?;
        registration.invocations.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(&registration.handler))
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Lifecycle state of `name`.
    #[must_use]
    pub fn state(&self, name: &str) -> ActionState {
        match self.actions.get(name) {
            None => ActionState::Unregistered,
            Some(r) => match r.invocations.load(Ordering::Relaxed) {
                0 => ActionState::Registered,
                n => ActionState::Invoked(n),
            },
        }
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
