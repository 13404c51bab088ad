//! Action registration and dispatch.
//!
//! A [`Dispatcher`] owns an [`ActionRegistry`] and a [`SharedStore`]. Each
//! dispatch takes the store lock, builds an [`ActionContext`] and hands it to
//! the registered [`ActionHandler`].
//!
//! [`SharedStore`]: crate::storage::SharedStore

mod dispatcher;
mod handler;
mod policy;
mod registry;
mod response;

pub use dispatcher::Dispatcher;
pub use handler::{ActionContext, ActionHandler};
pub use policy::{AccessPolicy, AllowAll, DenyList};
pub use registry::{ActionRegistry, ActionState};
pub use response::{ActionResponse, ErrorResponse, ResponseBody, NEXT_TOKEN_FIELD, REQUEST_ID_FIELD};
