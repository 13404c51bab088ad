//! Filter registries.
//!
//! Each domain module declares its supported filters as data: a filter name
//! maps to a projection returning the strings a record exposes under that
//! name, plus whether values compare exactly or as globs. Prefix entries
//! (`tag:<Key>`) receive the suffix after the prefix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::resource::Resource;
use crate::value::Value;

/// How filter values compare against projected strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Byte-for-byte equality.
    Exact,
    /// `*` and `?` wildcards.
    Glob,
}

type Projection<T> = Arc<dyn Fn(&T) -> Vec<String> + Send + Sync>;
type PrefixProjection<T> = Arc<dyn Fn(&T, &str) -> Vec<String> + Send + Sync>;

enum Projector<T> {
    Whole(Projection<T>),
    Prefixed(PrefixProjection<T>),
}

impl<T> Clone for Projector<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Whole(f) => Self::Whole(Arc::clone(f)),
            Self::Prefixed(f) => Self::Prefixed(Arc::clone(f)),
        }
    }
}

struct FilterDef<T> {
    mode: MatchMode,
    projector: Projector<T>,
}

impl<T> Clone for FilterDef<T> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            projector: self.projector.clone(),
        }
    }
}

/// A filter name resolved against a registry.
pub struct ResolvedFilter<'r, T> {
    mode: MatchMode,
    projector: &'r Projector<T>,
    suffix: String,
}

impl<T> ResolvedFilter<'_, T> {
    /// How values compare for this filter.
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Strings the record exposes under this filter.
    pub fn project(&self, record: &T) -> Vec<String> {
        match self.projector {
            Projector::Whole(f) => f(record),
            Projector::Prefixed(f) => f(record, &self.suffix),
        }
    }
}

/// Mapping from filter name to projection for records of type `T`.
///
/// # Examples
///
/// ```
/// use computesim::query::{FilterRegistry, MatchMode};
///
/// struct Row { state: &'static str }
///
/// let registry = FilterRegistry::new()
///     .exact("state", |r: &Row| vec![r.state.to_string()]);
/// assert!(registry.supports("state"));
/// assert!(!registry.supports("size"));
/// ```
pub struct FilterRegistry<T> {
    named: HashMap<String, FilterDef<T>>,
    prefixed: Vec<(String, FilterDef<T>)>,
}

impl<T> FilterRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            named: HashMap::new(),
            prefixed: Vec::new(),
        }
    }

    /// Registers (or replaces) a named filter.
    pub fn register<F>(&mut self, name: impl Into<String>, mode: MatchMode, projection: F) -> &mut Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        self.named.insert(
            name.into(),
            FilterDef {
                mode,
                projector: Projector::Whole(Arc::new(projection)),
            },
        );
        self
    }

    /// Registers (or replaces) a prefix filter such as `tag:`.
    pub fn register_prefix<F>(&mut self, prefix: impl Into<String>, mode: MatchMode, projection: F) -> &mut Self
    where
        F: Fn(&T, &str) -> Vec<String> + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        self.prefixed.retain(|(p, _)| *p != prefix);
        self.prefixed.push((
            prefix,
            FilterDef {
                mode,
                projector: Projector::Prefixed(Arc::new(projection)),
            },
        ));
        // Longest prefix wins on lookup.
        self.prefixed.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Builder-style exact-match filter.
    #[must_use]
    pub fn exact<F>(mut self, name: impl Into<String>, projection: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        self.register(name, MatchMode::Exact, projection);
        self
    }

    /// Builder-style wildcard filter.
    #[must_use]
    pub fn glob<F>(mut self, name: impl Into<String>, projection: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        self.register(name, MatchMode::Glob, projection);
        self
    }

    /// Builder-style prefix filter.
    #[must_use]
    pub fn prefixed<F>(mut self, prefix: impl Into<String>, mode: MatchMode, projection: F) -> Self
    where
        F: Fn(&T, &str) -> Vec<String> + Send + Sync + 'static,
    {
        self.register_prefix(prefix, mode, projection);
        self
    }

    /// Resolves a filter name; exact names take precedence over prefixes.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedFilter<'_, T>> {
        if let Some(def) = self.named.get(name) {
            return Some(ResolvedFilter {
                mode: def.mode,
                projector: &def.projector,
                suffix: String::new(),
            });
        }
        self.prefixed.iter().find_map(|(prefix, def)| {
            let suffix = name.strip_prefix(prefix.as_str())?;
            (!suffix.is_empty()).then(|| ResolvedFilter {
                mode: def.mode,
                projector: &def.projector,
                suffix: suffix.to_string(),
            })
        })
    }

    /// Returns true if `name` resolves to a filter.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Supported names, sorted; prefix filters render as `prefix*`.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .named
            .keys()
            .cloned()
            .chain(self.prefixed.iter().map(|(p, _)| format!("{p}*")))
            .collect();
        names.sort();
        names
    }
}

impl FilterRegistry<Resource> {
    /// Registry pre-loaded with filters every resource supports:
    /// `owner-id`, `resource-id`, `tag-key`, `tag-value` and `tag:<Key>`.
    #[must_use]
    pub fn with_resource_defaults() -> Self {
        Self::new()
            .exact("owner-id", |r: &Resource| vec![r.owner_id.to_string()])
            .exact("resource-id", |r: &Resource| vec![r.id().to_string()])
            .glob("tag-key", |r: &Resource| {
                r.tags().map(|(k, _)| k.to_string()).collect()
            })
            .glob("tag-value", |r: &Resource| {
                r.tags().map(|(_, v)| v.to_string()).collect()
            })
            .prefixed("tag:", MatchMode::Glob, |r: &Resource, key: &str| {
                r.tag(key).map(|v| vec![v.to_string()]).unwrap_or_default()
            })
    }

    /// Filter on the resource id (e.g. `instance-id`).
    #[must_use]
    pub fn id_filter(self, name: impl Into<String>) -> Self {
        self.exact(name, |r: &Resource| vec![r.id().to_string()])
    }

    /// Filter projecting one attribute through [`Value::filter_terms`].
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: impl Into<String>, mode: MatchMode) -> Self {
        let attribute = attribute.into();
        self.register(name, mode, move |r: &Resource| {
            r.attribute(&attribute)
                .map(Value::filter_terms)
                .unwrap_or_default()
        });
        self
    }
}

impl<T> Default for FilterRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FilterRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            named: self.named.clone(),
            prefixed: self.prefixed.clone(),
        }
    }
}

impl<T> fmt::Debug for FilterRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("names", &self.names())
            .finish()
    }
}
