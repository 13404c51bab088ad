//! Flattened parameter normalization.
//!
//! The wire encoding flattens structured and repeated parameters into dotted
//! keys with 1-based indices:
//!
//! ```text
//! Group.<i>.Field                 -> records of scalars
//! Group.<i>.Field.<j>             -> records holding lists
//! Group.<i>.Field.<j>.SubField    -> records holding lists of records
//! ```
//!
//! Normalization rebuilds the nested shape. Indices sort numerically and gaps
//! are skipped. Keys are processed in sorted order so that, for any input
//! iteration order, the output and any reported error are the same.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ParameterError;

/// A normalized parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A leaf value.
    Scalar(String),
    /// Indexed members in ascending index order.
    List(Vec<ParamValue>),
    /// Named fields.
    Record(ParamRecord),
}

/// Field name to value mapping produced for each indexed member.
pub type ParamRecord = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// The record, if this is one.
    pub const fn as_record(&self) -> Option<&ParamRecord> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

#[derive(Debug)]
enum Node {
    Leaf(String),
    Fields(BTreeMap<String, Node>),
    Indexed(BTreeMap<u32, Node>),
}

impl Node {
    const fn empty() -> Self {
        Self::Fields(BTreeMap::new())
    }

    fn is_empty_fields(&self) -> bool {
        matches!(self, Self::Fields(f) if f.is_empty())
    }

    fn into_value(self) -> ParamValue {
        match self {
            Self::Leaf(s) => ParamValue::Scalar(s),
            Self::Fields(fields) => ParamValue::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect(),
            ),
            Self::Indexed(slots) => {
                ParamValue::List(slots.into_values().map(Self::into_value).collect())
            }
        }
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(key: &str, segment: &str) -> Result<u32, ParameterError> {
    let invalid = || ParameterError::InvalidIndex {
        key: key.to_string(),
        segment: segment.to_string(),
    };
    if !is_index(segment) {
        return Err(invalid());
    }
    match segment.parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(i) => Ok(i),
    }
}

fn insert(node: &mut Node, key: &str, rest: &[&str], value: &str) -> Result<(), ParameterError> {
    let Some((head, tail)) = rest.split_first() else {
        if !node.is_empty_fields() {
            return Err(ParameterError::ConflictingKey {
                key: key.to_string(),
            });
        }
        *node = Node::Leaf(value.to_string());
        return Ok(());
    };

    if head.is_empty() {
        return Err(ParameterError::MalformedKey {
            key: key.to_string(),
            reason: "empty path segment".to_string(),
        });
    }

    // A fresh node becomes a list the first time it sees an index.
    if node.is_empty_fields() && is_index(head) {
        *node = Node::Indexed(BTreeMap::new());
    }

    let child = match node {
        Node::Leaf(_) => {
            return Err(ParameterError::ConflictingKey {
                key: key.to_string(),
            })
        }
        Node::Indexed(slots) => slots
            .entry(parse_index(key, head)?)
            .or_insert_with(Node::empty),
        Node::Fields(fields) => {
            if is_index(head) {
                return Err(ParameterError::ConflictingKey {
                    key: key.to_string(),
                });
            }
            fields.entry((*head).to_string()).or_insert_with(Node::empty)
        }
    };
    insert(child, key, tail, value)
}

fn sorted_pairs<I, K, V>(params: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

fn build_indexed<I, K, V>(params: I, name: &str) -> Result<BTreeMap<u32, Node>, ParameterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let prefix = format!("{name}.");
    let mut root = Node::Indexed(BTreeMap::new());
    for (key, value) in sorted_pairs(params) {
        let Some(suffix) = key.strip_prefix(&prefix) else {
            continue;
        };
        let segments: Vec<&str> = suffix.split('.').collect();
        insert(&mut root, &key, &segments, &value)?;
    }
    match root {
        Node::Indexed(slots) => Ok(slots),
        _ => Err(ParameterError::MalformedKey {
            key: name.to_string(),
            reason: "expected an indexed parameter".to_string(),
        }),
    }
}

/// Normalize `Group.<i>.…` keys into one record per index, ascending.
///
/// Keys outside the group are ignored. A member without fields
/// (`Group.<i>=value`) is malformed.
///
/// # Examples
///
/// ```
/// use computesim::params::{normalize_group, ParamValue};
/// use std::collections::HashMap;
///
/// let params: HashMap<&str, &str> = [("G.2.K", "b"), ("G.1.K", "a")].into_iter().collect();
/// let records = normalize_group(&params, "G").unwrap();
/// assert_eq!(records[0]["K"], ParamValue::from("a"));
/// assert_eq!(records[1]["K"], ParamValue::from("b"));
/// ```
pub fn normalize_group<I, K, V>(params: I, group: &str) -> Result<Vec<ParamRecord>, ParameterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Ok(normalize_group_indexed(params, group)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Like [`normalize_group`], keeping each record's wire index.
///
/// Callers use the index to name offending keys the way the client sent
/// them, since gaps make the position in the output differ from it.
pub fn normalize_group_indexed<I, K, V>(
    params: I,
    group: &str,
) -> Result<Vec<(u32, ParamRecord)>, ParameterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_indexed(params, group)?
        .into_iter()
        .map(|(i, node)| match node.into_value() {
            ParamValue::Record(record) => Ok((i, record)),
            _ => Err(ParameterError::MalformedKey {
                key: format!("{group}.{i}"),
                reason: "expected a structured member".to_string(),
            }),
        })
        .collect()
}

/// Normalize `Name.<i>` keys into a list of scalars, ascending.
pub fn normalize_list<I, K, V>(params: I, name: &str) -> Result<Vec<String>, ParameterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    build_indexed(params, name)?
        .into_iter()
        .map(|(i, node)| match node {
            Node::Leaf(s) => Ok(s),
            _ => Err(ParameterError::MalformedKey {
                key: format!("{name}.{i}"),
                reason: "expected a scalar member".to_string(),
            }),
        })
        .collect()
}

/// Normalize a whole request into one record.
///
/// A name followed by a numeric index (`InstanceId.1`, `Filter.1.Name`)
/// becomes a list under that name, and every other key under the same name
/// must then be indexed too. Keys without a numeric index, dotted or not
/// (`Action`, `Placement.AvailabilityZone`), pass through unchanged.
pub fn normalize_all<I, K, V>(params: I) -> Result<ParamRecord, ParameterError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs = sorted_pairs(params);
    let indexed: BTreeSet<&str> = pairs
        .iter()
        .filter_map(|(key, _)| {
            let mut segments = key.split('.');
            let head = segments.next()?;
            segments.next().filter(|s| is_index(s)).map(|_| head)
        })
        .collect();

    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (key, value) in &pairs {
        let segments: Vec<&str> = key.split('.').collect();
        let Some((head, tail)) = segments.split_first() else {
            continue;
        };
        if head.is_empty() || is_index(head) {
            return Err(ParameterError::MalformedKey {
                key: key.clone(),
                reason: "parameter name must not be empty or numeric".to_string(),
            });
        }
        if !indexed.contains(head) {
            if root.insert(key.clone(), Node::Leaf(value.clone())).is_some() {
                return Err(ParameterError::ConflictingKey { key: key.clone() });
            }
            continue;
        }
        let node = root
            .entry((*head).to_string())
            .or_insert_with(|| Node::Indexed(BTreeMap::new()));
        insert(node, key, tail, value)?;
    }
    Ok(root
        .into_iter()
        .map(|(k, v)| (k, v.into_value()))
        .collect())
}
