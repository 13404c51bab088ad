//! Identifier types and allocation.
//!
//! Resource ids mirror the target API's own shapes (`i-0a1b2c3d4e5f67890`):
//! a kind prefix, a dash, and 17 hex digits (68 bits of entropy). Request ids
//! are 128-bit random values rendered as UUID text and carry no identity
//! meaning.

use std::borrow::Borrow;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex digits after the prefix of an allocated resource id.
pub const ID_SUFFIX_LEN: usize = 17;

const ID_SUFFIX_MASK: u128 = (1u128 << (ID_SUFFIX_LEN * 4)) - 1;

/// Opaque, process-unique resource identifier.
///
/// # Examples
///
/// ```
/// use computesim::ResourceId;
///
/// let id = ResourceId::new("vol-0123456789abcdef0");
/// assert_eq!(id.prefix(), Some("vol"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns everything before the last dash, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.0.rsplit_once('-').map(|(prefix, _)| prefix)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Simulated account that owns every resource of a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an account id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self("123456789012".to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request correlation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug)]
enum Entropy {
    Thread,
    Seeded(Mutex<StdRng>),
}

/// Generates resource ids and request ids.
///
/// The default allocator draws from the thread-local RNG and never blocks.
/// A seeded allocator is deterministic across runs; it serializes draws
/// behind a short-lived lock.
#[derive(Debug)]
pub struct IdAllocator {
    entropy: Entropy,
}

impl IdAllocator {
    /// Creates an allocator backed by the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entropy: Entropy::Thread,
        }
    }

    /// Creates a deterministic allocator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            entropy: Entropy::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Allocates `<prefix>-<17 hex digits>`.
    #[must_use]
    pub fn allocate(&self, prefix: &str) -> ResourceId {
        let bits = self.next_u128() & ID_SUFFIX_MASK;
        ResourceId(format!("{prefix}-{bits:0width$x}", width = ID_SUFFIX_LEN))
    }

    /// Allocates a 128-bit request correlation id.
    #[must_use]
    pub fn allocate_request_id(&self) -> RequestId {
        RequestId(Uuid::from_u128(self.next_u128()))
    }

    fn next_u128(&self) -> u128 {
        match &self.entropy {
            Entropy::Thread => rand::thread_rng().gen(),
            Entropy::Seeded(rng) => rng.lock().unwrap_or_else(PoisonError::into_inner).gen(),
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_allocate_shape() {
        let ids = IdAllocator::new();
        let id = ids.allocate("i");
        let (prefix, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(prefix, "i");
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_allocate_keeps_multi_dash_prefix() {
        let ids = IdAllocator::new();
        let id = ids.allocate("tgw-attach");
        assert_eq!(id.prefix(), Some("tgw-attach"));
    }

    #[test]
    fn test_allocate_is_unique_in_practice() {
        let ids = IdAllocator::new();
        let set: HashSet<_> = (0..10_000).map(|_| ids.allocate("snap")).collect();
        assert_eq!(set.len(), 10_000);
    }

    #[test]
    fn test_seeded_allocator_is_deterministic() {
        let a = IdAllocator::seeded(7);
        let b = IdAllocator::seeded(7);
        assert_eq!(a.allocate("vol"), b.allocate("vol"));
        assert_eq!(a.allocate_request_id(), b.allocate_request_id());
    }

    #[test]
    fn test_request_id_format() {
        let id = IdAllocator::new().allocate_request_id();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
    }

    #[test]
    fn test_account_default() {
        assert_eq!(AccountId::default().as_str(), "123456789012");
    }
}
