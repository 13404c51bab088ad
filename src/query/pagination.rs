//! Token-based pagination.
//!
//! A continuation token is the decimal offset of the next page's first
//! record. The engine keeps no state between calls: re-sending a token over
//! an unchanged collection reproduces the same page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Page-size bounds for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBounds {
    min: usize,
    default: usize,
    max: usize,
}

impl PageBounds {
    /// Bounds most describe actions use: 5..=1000, default 1000.
    pub const DESCRIBE: Self = Self {
        min: 5,
        default: 1000,
        max: 1000,
    };

    /// Creates bounds; `min` is raised to 1, `max` to `min`, and `default` is
    /// clamped into `[min, max]`.
    #[must_use]
    pub fn new(min: usize, default: usize, max: usize) -> Self {
        let min = min.max(1);
        let max = max.max(min);
        Self {
            min,
            default: default.clamp(min, max),
            max,
        }
    }

    /// Smallest page size a request may ask for.
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Page size used when the request gives none.
    #[must_use]
    pub const fn default_size(&self) -> usize {
        self.default
    }

    /// Largest page size a request may ask for.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Effective page size. Out-of-range requests are clamped, never rejected.
    #[must_use]
    pub fn page_size(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default,
            Some(n) => usize::try_from(n).unwrap_or(0).clamp(self.min, self.max),
        }
    }
}

impl Default for PageBounds {
    fn default() -> Self {
        Self::DESCRIBE
    }
}

/// Paging inputs of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested page size.
    pub max_results: Option<i64>,
    /// Token returned by the previous page.
    pub next_token: Option<String>,
}

impl PageRequest {
    /// First page with an explicit size.
    #[must_use]
    pub fn first(max_results: i64) -> Self {
        Self {
            max_results: Some(max_results),
            next_token: None,
        }
    }

    /// Same size, continuing from `token`.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.next_token = token;
        self
    }

    /// Offset encoded by the token (0 when absent).
    pub fn offset(&self) -> ApiResult<usize> {
        self.next_token
            .as_deref()
            .map_or(Ok(0), |t| t.parse::<ContinuationToken>().map(|t| t.offset()))
    }
}

/// Opaque continuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContinuationToken(usize);

impl ContinuationToken {
    /// Token resuming at `offset`.
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Zero-based offset into the result sequence.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.0
    }
}

impl FromStr for ContinuationToken {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidToken {
            token: s.to_string(),
        };
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<usize>().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records in this page.
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if another page follows.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    /// Maps items, keeping the token.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}

/// Slices `[offset, offset + size)` out of `items`.
pub(crate) fn slice_page<T>(items: Vec<T>, offset: usize, size: usize) -> Page<T> {
    let total = items.len();
    let start = offset.min(total);
    let end = offset.saturating_add(size).min(total);
    let next_token = (end < total).then(|| ContinuationToken::new(end).to_string());
    Page {
        items: items.into_iter().skip(start).take(end - start).collect(),
        next_token,
    }
}

/// Paginates an already filtered, stably ordered sequence.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest, bounds: PageBounds) -> ApiResult<Page<T>> {
    let offset = request.offset()?;
    Ok(slice_page(items, offset, bounds.page_size(request.max_results)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_bounds_clamp() {
        let b = PageBounds::new(5, 50, 100);
        assert_eq!(b.page_size(None), 50);
        assert_eq!(b.page_size(Some(1)), 5);
        assert_eq!(b.page_size(Some(-3)), 5);
        assert_eq!(b.page_size(Some(10_000)), 100);
        assert_eq!(b.page_size(Some(42)), 42);
    }

    #[test]
    fn test_bounds_normalized() {
        let b = PageBounds::new(0, 0, 0);
        assert_eq!((b.min(), b.default_size(), b.max()), (1, 1, 1));
        let b = PageBounds::new(10, 500, 100);
        assert_eq!(b.default_size(), 100);
    }

    #[test]
    fn test_first_and_last_page() {
        let bounds = PageBounds::new(1, 10, 10);
        let page = paginate(numbers(25), &PageRequest::first(10), bounds).unwrap();
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.next_token.as_deref(), Some("10"));

        let page = paginate(numbers(25), &PageRequest::first(10).with_token(Some("20".into())), bounds).unwrap();
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert!(!page.has_more());
    }

    #[test]
    fn test_exact_fit_has_no_token() {
        let page = paginate(numbers(10), &PageRequest::first(10), PageBounds::new(1, 10, 10)).unwrap();
        assert_eq!(page.len(), 10);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let req = PageRequest::first(5).with_token(Some("99".into()));
        let page = paginate(numbers(3), &req, PageBounds::new(1, 5, 5)).unwrap();
        assert!(page.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_invalid_tokens() {
        for bad in ["", "abc", "-1", "+5", "1.5", "99999999999999999999999999"] {
            let req = PageRequest::default().with_token(Some(bad.to_string()));
            let err = paginate(numbers(3), &req, PageBounds::default()).unwrap_err();
            assert!(matches!(err, ApiError::InvalidToken { ref token } if token == bad), "{bad}");
        }
    }

    #[test]
    fn test_page_map_keeps_token() {
        let page = paginate(numbers(4), &PageRequest::first(1), PageBounds::new(1, 1, 1)).unwrap();
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![0]);
        assert_eq!(mapped.next_token.as_deref(), Some("1"));
    }
}
