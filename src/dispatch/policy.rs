//! Simulated permissions.
//!
//! The core checks permission only to pick the dry-run outcome; real calls
//! are not authorized here.

use std::collections::BTreeSet;
use std::fmt;

/// Decides whether the simulated principal may perform an action.
pub trait AccessPolicy: Send + Sync + fmt::Debug {
    fn is_permitted(&self, action: &str) -> bool;
}

/// Permits every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn is_permitted(&self, _action: &str) -> bool {
        true
    }
}

/// Permits everything except the listed actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyList {
    denied: BTreeSet<String>,
}

impl DenyList {
    /// Creates an empty deny list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action to the list.
    #[must_use]
    pub fn deny(mut self, action: impl Into<String>) -> Self {
        self.denied.insert(action.into());
        self
    }

    /// Returns true if no action is denied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.denied.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DenyList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            denied: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessPolicy for DenyList {
    fn is_permitted(&self, action: &str) -> bool {
        !self.denied.contains(action)
    }
}
