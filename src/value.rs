//! Attribute values carried by resources.
//!
//! Values support primitives, references to other resources, timestamps and
//! nested lists/maps. Filter evaluation sees a value through
//! [`Value::filter_terms`]; response shaping sees it through [`Value::to_json`].

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ResourceId;

/// Possible values of a resource attribute.
///
/// # Examples
///
/// ```
/// use computesim::Value;
///
/// let size = Value::Int(100);
/// assert_eq!(size.filter_terms(), vec!["100".to_string()]);
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Reference(ResourceId),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
}

impl Value {
    /// Returns true for `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is one.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text of a string or reference value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            Self::Reference(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// The referenced id, if this is a reference.
    pub const fn as_reference(&self) -> Option<&ResourceId> {
        match self {
            Self::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// The timestamp, if this is one.
    pub const fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// The map, if this is one.
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Reference(_) => "reference",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
        }
    }

    /// Renders the value as the strings a filter compares against.
    ///
    /// Lists contribute every element; maps and nulls contribute nothing.
    #[must_use]
    pub fn filter_terms(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms(&self, out: &mut Vec<String>) {
        match self {
            Self::Bool(v) => out.push(v.to_string()),
            Self::Int(v) => out.push(v.to_string()),
            Self::Float(v) => out.push(v.to_string()),
            Self::String(v) => out.push(v.clone()),
            Self::Reference(id) => out.push(id.to_string()),
            Self::Timestamp(t) => out.push(format_timestamp(t)),
            Self::List(items) => {
                for item in items {
                    item.collect_terms(out);
                }
            }
            Self::Map(_) | Self::Null => {}
        }
    }

    /// Converts to plain JSON for response bodies.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::String(v) => Json::String(v.clone()),
            Self::Reference(id) => Json::String(id.to_string()),
            Self::Timestamp(t) => Json::String(format_timestamp(t)),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Null => Json::Null,
        }
    }
}

/// Timestamp rendering used on the wire (`2024-01-02T03:04:05.000Z`).
#[must_use]
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Reference(id) => write!(f, "ref:{id}"),
            Self::Timestamp(t) => write!(f, "{}", format_timestamp(t)),
            Self::List(v) => write!(f, "list[{}]", v.len()),
            Self::Map(v) => write!(f, "map[{}]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<ResourceId> for Value {
    fn from(v: ResourceId) -> Self {
        Self::Reference(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
