//! Glob wildcards for text filters.
//!
//! `*` matches any run of characters, `?` exactly one; a backslash makes the
//! next character literal. Patterns compile to anchored regexes kept in a
//! bounded process-wide cache.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;

use crate::error::{ApiError, ApiResult, ParameterError};

const REGEX_CACHE_MAX: usize = 1024;

static REGEX_CACHE: OnceLock<RwLock<HashMap<String, Regex>>> = OnceLock::new();

/// Returns true if the pattern contains an unescaped wildcard.
#[must_use]
pub fn has_wildcard(pattern: &str) -> bool {
    let mut escaped = false;
    for c in pattern.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

/// Translates a glob into an anchored regex source.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(next) => out.push_str(&regex::escape(&next.to_string())),
                None => out.push_str(&regex::escape("\\")),
            },
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// Compiles a glob, reusing cached regexes.
pub fn compile_glob(pattern: &str) -> ApiResult<Regex> {
    let cache = REGEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    {
        let guard = cache
            .read()
            .map_err(|_| ApiError::internal("glob cache lock poisoned"))?;
        if let Some(re) = guard.get(pattern) {
            return Ok(re.clone());
        }
    }

    let compiled = Regex::new(&glob_to_regex(pattern)).map_err(|e| {
        ApiError::Parameter(ParameterError::invalid_value(
            "Filter.Value",
            pattern,
            format!("invalid wildcard pattern: {e}"),
        ))
    })?;

    let mut guard = cache
        .write()
        .map_err(|_| ApiError::internal("glob cache lock poisoned"))?;

    if guard.len() >= REGEX_CACHE_MAX {
        guard.clear();
    }

    guard
        .entry(pattern.to_string())
        .or_insert_with(|| compiled.clone());
    Ok(compiled)
}

/// Matches `text` against a glob.
pub fn glob_match(pattern: &str, text: &str) -> ApiResult<bool> {
    if !has_wildcard(pattern) {
        return Ok(unescape(pattern) == text);
    }
    Ok(compile_glob(pattern)?.is_match(text))
}

/// Removes glob escapes from a wildcard-free pattern.
#[must_use]
pub fn unescape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_and_question_mark() {
        assert!(glob_match("t3.*", "t3.micro").unwrap());
        assert!(!glob_match("t3.*", "m5.large").unwrap());
        assert!(glob_match("web-?", "web-1").unwrap());
        assert!(!glob_match("web-?", "web-10").unwrap());
        assert!(glob_match("*", "").unwrap());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob_match("a.b*", "a.bc").unwrap());
        assert!(!glob_match("a.b*", "axbc").unwrap());
        assert!(glob_match("(x)+*", "(x)+y").unwrap());
    }

    #[test]
    fn test_escaped_wildcards() {
        assert!(!has_wildcard(r"lit\*"));
        assert!(glob_match(r"lit\*", "lit*").unwrap());
        assert!(!glob_match(r"lit\*", "literal").unwrap());
        assert!(glob_match(r"a\*b*", "a*bc").unwrap());
    }

    #[test]
    fn test_exact_without_wildcard() {
        assert!(glob_match("running", "running").unwrap());
        assert!(!glob_match("running", "running2").unwrap());
    }

    #[test]
    fn test_compile_is_cached() {
        let a = compile_glob("cache-test-*").unwrap();
        let b = compile_glob("cache-test-*").unwrap();
        assert_eq!(a.as_str(), b.as_str());
    }
}
