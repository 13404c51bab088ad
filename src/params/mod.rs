//! Request parameter handling.
//!
//! The transport hands the core a flat string-to-string mapping encoded with
//! the target API's dotted, 1-based index convention. [`normalize_group`] rebuilds
//! nested records from it; [`RequestParams`] wraps the mapping with typed
//! accessors handlers use for validation.

mod normalize;
mod request;

pub use normalize::{
    normalize_all, normalize_group, normalize_group_indexed, normalize_list, ParamRecord, ParamValue,
};
pub use request::{RequestParams, TagSpecification};
