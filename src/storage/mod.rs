//! Resource storage for computesim.
//!
//! [`ResourceStore`] defines the contract; [`InMemoryResourceStore`] is the
//! process-local backend; [`SharedStore`] is the lock-guarded handle that the
//! dispatcher lends to handlers.

mod memory;
mod shared;
mod snapshot;
mod traits;

pub use memory::InMemoryResourceStore;
pub use shared::{SharedStore, StoreGuard};
pub use snapshot::StoreSnapshot;
pub use traits::{ResourceMut, ResourceStore, TypedView};
