//! # computesim - In-memory control plane for a cloud compute API
//!
//! computesim is the shared runtime beneath an emulated compute API. Domain
//! handlers (instances, snapshots, capacity reservations, ...) plug into it
//! and get the target API's request/response conventions for free.
//!
//! ## Core Concepts
//!
//! - **Resource**: a stored simulated entity with a typed kind, attributes and tags
//! - **ResourceStore**: id-indexed and kind-indexed storage, one account per instance
//! - **Query**: filter evaluation (AND across filters, OR within) plus token paging
//! - **RequestParams**: the flat `Group.N.Field` parameter encoding, normalized
//! - **Dispatcher**: action name to handler routing, with dry-run short-circuiting
//!
//! ## Usage
//!
//! ```rust
//! use computesim::{
//!     ActionContext, ApiResult, Dispatcher, RequestParams, ResourceKind, ResponseBody,
//!     SharedStore,
//! };
//!
//! fn create_snapshot(ctx: &mut ActionContext<'_>, params: &RequestParams) -> ApiResult<ResponseBody> {
//!     let volume_id = params.require("VolumeId")?;
//!     ctx.resolve_reference(&ResourceKind::Volume, volume_id)?;
//!     ctx.dry_run_guard(params)?;
//!     let snapshot = ctx
//!         .new_resource(ResourceKind::Snapshot)
//!         .attribute("volumeId", volume_id)
//!         .attribute("state", "completed")
//!         .build()?;
//!     let id = snapshot.id().to_string();
//!     ctx.put(snapshot)?;
//!     Ok(ResponseBody::new().with("snapshotId", id))
//! }
//!
//! let mut dispatcher = Dispatcher::new(SharedStore::default());
//! dispatcher.register("CreateSnapshot", create_snapshot);
//!
//! let err = dispatcher
//!     .dispatch("CreateSnapshot", &RequestParams::new().with("VolumeId", "vol-missing"))
//!     .unwrap_err();
//! assert_eq!(err.code(), "InvalidVolume.NotFound");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod id;
pub mod resource;
pub mod value;

// Storage, parameters and queries
pub mod params;
pub mod query;
pub mod storage;

// Protocol
pub mod dispatch;
pub mod dryrun;

pub mod config;
pub mod telemetry;

// Re-export primary types at crate root for convenience
pub use config::{ConfigError, EmulatorConfig};
pub use dispatch::{
    AccessPolicy, ActionContext, ActionHandler, ActionRegistry, ActionResponse, ActionState,
    AllowAll, DenyList, Dispatcher, ErrorResponse, ResponseBody,
};
pub use dryrun::dry_run_guard;
pub use error::{ApiError, ApiResult, ParameterError, StorageError};
pub use id::{AccountId, IdAllocator, RequestId, ResourceId};
pub use params::{normalize_all, normalize_group, normalize_list, ParamRecord, ParamValue, RequestParams};
pub use query::{query, Filter, FilterRegistry, MatchMode, Page, PageBounds, PageRequest, Query};
pub use resource::{Resource, ResourceBuilder, ResourceKind};
pub use storage::{InMemoryResourceStore, ResourceStore, SharedStore, StoreSnapshot};
pub use value::Value;
