//! Filter evaluation and paging over record collections.
//!
//! Filters AND together; the values of one filter OR together. Filter names
//! resolve through a [`FilterRegistry`]; a name the registry does not know
//! fails every record unless the caller opts into ignoring it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;

use super::filter::Filter;
use super::glob::{compile_glob, has_wildcard, unescape};
use super::pagination::{slice_page, Page, PageBounds, PageRequest};
use super::registry::{FilterRegistry, MatchMode, ResolvedFilter};

/// What to do with a filter name the registry does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFilterPolicy {
    /// The filter matches no record.
    #[default]
    Reject,
    /// The filter is dropped from the query.
    Ignore,
}

enum Matcher {
    Exact(String),
    Glob(Regex),
}

impl Matcher {
    fn compile(mode: MatchMode, value: &str) -> ApiResult<Self> {
        Ok(match mode {
            MatchMode::Exact => Self::Exact(value.to_string()),
            MatchMode::Glob if has_wildcard(value) => Self::Glob(compile_glob(value)?),
            MatchMode::Glob => Self::Exact(unescape(value)),
        })
    }

    fn matches(&self, term: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == term,
            Self::Glob(re) => re.is_match(term),
        }
    }
}

struct CompiledFilter<'r, T> {
    // `None` for an unknown name under `Reject`.
    resolved: Option<ResolvedFilter<'r, T>>,
    matchers: Vec<Matcher>,
}

impl<T> CompiledFilter<'_, T> {
    fn matches(&self, record: &T) -> bool {
        let Some(resolved) = &self.resolved else {
            return false;
        };
        if self.matchers.is_empty() {
            return false;
        }
        resolved
            .project(record)
            .iter()
            .any(|term| self.matchers.iter().any(|m| m.matches(term)))
    }
}

/// A reusable query over records of type `T`.
///
/// # Examples
///
/// ```
/// use computesim::query::{Filter, FilterRegistry, PageBounds, PageRequest, Query};
///
/// let registry = FilterRegistry::new()
///     .glob("name", |s: &String| vec![s.clone()]);
/// let records: Vec<String> = ["web-1", "web-2", "db-1"].iter().map(|s| s.to_string()).collect();
///
/// let page = Query::new(&registry)
///     .bounds(PageBounds::new(1, 10, 10))
///     .run(&records, &[Filter::new("name", ["web-*"])], &PageRequest::default())
///     .unwrap();
/// assert_eq!(page.items, vec!["web-1", "web-2"]);
/// assert!(page.next_token.is_none());
/// ```
pub struct Query<'r, T> {
    registry: &'r FilterRegistry<T>,
    bounds: PageBounds,
    unknown: UnknownFilterPolicy,
}

impl<'r, T> Query<'r, T> {
    /// Query over filters supported by `registry`, with default bounds.
    #[must_use]
    pub fn new(registry: &'r FilterRegistry<T>) -> Self {
        Self {
            registry,
            bounds: PageBounds::default(),
            unknown: UnknownFilterPolicy::default(),
        }
    }

    /// Page-size bounds of the action being served.
    #[must_use]
    pub const fn bounds(mut self, bounds: PageBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sets how unsupported filter names are treated.
    #[must_use]
    pub const fn unknown_filters(mut self, policy: UnknownFilterPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// Shorthand for `unknown_filters(UnknownFilterPolicy::Ignore)`.
    #[must_use]
    pub const fn ignore_unknown_filters(self) -> Self {
        self.unknown_filters(UnknownFilterPolicy::Ignore)
    }

    fn compile(&self, filters: &[Filter]) -> ApiResult<Vec<CompiledFilter<'r, T>>> {
        let mut compiled = Vec::with_capacity(filters.len());
        for filter in filters {
            let Some(resolved) = self.registry.resolve(&filter.name) else {
                debug!(filter = %filter.name, policy = ?self.unknown, "unknown filter");
                if self.unknown == UnknownFilterPolicy::Reject {
                    compiled.push(CompiledFilter {
                        resolved: None,
                        matchers: Vec::new(),
                    });
                }
                continue;
            };
            let matchers = filter
                .values
                .iter()
                .map(|v| Matcher::compile(resolved.mode(), v))
                .collect::<ApiResult<Vec<_>>>()?;
            compiled.push(CompiledFilter {
                resolved: Some(resolved),
                matchers,
            });
        }
        Ok(compiled)
    }

    /// Records matching every filter, in input order.
    ///
    /// # Errors
    /// - `Parameter`: a wildcard value did not compile
    pub fn filter<'a, I>(&self, records: I, filters: &[Filter]) -> ApiResult<Vec<&'a T>>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let compiled = self.compile(filters)?;
        Ok(records
            .into_iter()
            .filter(|record| compiled.iter().all(|f| f.matches(record)))
            .collect())
    }

    /// Filters, then returns the requested page.
    ///
    /// # Errors
    /// - `InvalidToken`: the continuation token is not a decimal offset
    /// - `Parameter`: a wildcard value did not compile
    pub fn run<'a, I>(&self, records: I, filters: &[Filter], page: &PageRequest) -> ApiResult<Page<&'a T>>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let offset = page.offset()?;
        let matched = self.filter(records, filters)?;
        Ok(slice_page(matched, offset, self.bounds.page_size(page.max_results)))
    }
}

/// One-shot [`Query::run`] with the default unknown-filter policy.
///
/// # Errors
/// - `InvalidToken`: the continuation token is not a decimal offset
/// - `Parameter`: a wildcard value did not compile
pub fn query<'a, T, I>(
    records: I,
    filters: &[Filter],
    registry: &FilterRegistry<T>,
    page: &PageRequest,
    bounds: PageBounds,
) -> ApiResult<Page<&'a T>>
where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
{
    Query::new(registry).bounds(bounds).run(records, filters, page)
}
