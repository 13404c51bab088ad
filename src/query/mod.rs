//! Filtering and pagination over resource collections.

mod engine;
mod filter;
mod glob;
mod pagination;
mod registry;

pub use engine::{query, Query, UnknownFilterPolicy};
pub use filter::Filter;
pub use glob::{compile_glob, glob_match, has_wildcard};
pub use pagination::{paginate, ContinuationToken, Page, PageBounds, PageRequest};
pub use registry::{FilterRegistry, MatchMode, ResolvedFilter};
