//! Named filters.

use serde::{Deserialize, Serialize};

/// A named predicate whose values are OR-joined.
///
/// Values form an ordered set: duplicates are dropped, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Filter name, e.g. `instance-type` or `tag:Name`.
    pub name: String,
    /// Accepted values.
    pub values: Vec<String>,
}

impl Filter {
    /// Creates a filter, de-duplicating values in order.
    #[must_use]
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            name: name.into(),
            values: unique,
        }
    }
}
