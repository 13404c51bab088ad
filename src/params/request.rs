//! Typed access to a request's flat parameters.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::error::ParameterError;
use crate::query::{Filter, PageRequest};

use super::normalize::{
    normalize_all, normalize_group, normalize_group_indexed, normalize_list, ParamRecord, ParamValue,
};

/// Tags requested for resources created by an action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSpecification {
    /// Resource type the tags apply to, if given.
    pub resource_type: Option<String>,
    /// Key/value pairs in request order.
    pub tags: Vec<(String, String)>,
}

/// Flat parameters of one request, as the transport decoded them.
///
/// # Examples
///
/// ```
/// use computesim::RequestParams;
///
/// let params: RequestParams = [
///     ("InstanceId.1", "i-1"),
///     ("InstanceId.2", "i-2"),
///     ("DryRun", "true"),
/// ]
/// .into_iter()
/// .collect();
/// assert_eq!(params.string_list("InstanceId").unwrap(), vec!["i-1", "i-2"]);
/// assert!(params.dry_run().unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Builder-style [`RequestParams::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the parameter or `MissingParameter`.
    pub fn require(&self, key: &str) -> Result<&str, ParameterError> {
        self.get(key).ok_or_else(|| ParameterError::missing(key))
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of flat parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the request carries no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the flat parameters in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.values.iter()
    }

    /// Parses a boolean parameter (`true`/`false`, any case).
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ParameterError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        if raw.eq_ignore_ascii_case("true") {
            Ok(Some(true))
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(Some(false))
        } else {
            Err(ParameterError::invalid_value(key, raw, "expected a boolean"))
        }
    }

    /// Parses an integer parameter.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ParameterError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ParameterError::invalid_value(key, raw, "expected an integer"))
            })
            .transpose()
    }

    /// `Name.<i>` scalars, ascending by index.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ParameterError> {
        normalize_list(&self.values, name)
    }

    /// `Group.<i>.…` records, ascending by index.
    pub fn group(&self, name: &str) -> Result<Vec<ParamRecord>, ParameterError> {
        normalize_group(&self.values, name)
    }

    /// `Group.<i>.…` records paired with their wire index `i`.
    pub fn indexed_group(&self, name: &str) -> Result<Vec<(u32, ParamRecord)>, ParameterError> {
        normalize_group_indexed(&self.values, name)
    }

    /// The whole request as one nested record.
    pub fn normalize(&self) -> Result<ParamRecord, ParameterError> {
        normalize_all(&self.values)
    }

    /// The `DryRun` flag (default false).
    pub fn dry_run(&self) -> Result<bool, ParameterError> {
        Ok(self.get_bool("DryRun")?.unwrap_or(false))
    }

    /// `MaxResults` and `NextToken`.
    pub fn page_request(&self) -> Result<PageRequest, ParameterError> {
        Ok(PageRequest {
            max_results: self.get_i64("MaxResults")?,
            next_token: self.get("NextToken").map(str::to_string),
        })
    }

    /// `Filter.<i>.Name` / `Filter.<i>.Value.<j>` as filters.
    ///
    /// A filter without values matches nothing. Errors name keys by the index
    /// the client sent.
    pub fn filters(&self) -> Result<Vec<Filter>, ParameterError> {
        self.indexed_group("Filter")?
            .into_iter()
            .map(|(index, record)| {
                let name = record
                    .get("Name")
                    .and_then(ParamValue::as_scalar)
                    .ok_or_else(|| ParameterError::missing(format!("Filter.{index}.Name")))?;
                let not_scalar = || {
                    ParameterError::invalid_value(
                        format!("Filter.{index}.Value"),
                        "",
                        "filter values must be scalars",
                    )
                };
                let values = match record.get("Value") {
                    None => Vec::new(),
                    Some(ParamValue::Scalar(v)) => vec![v.clone()],
                    Some(ParamValue::List(items)) => items
                        .iter()
                        .map(|item| item.as_scalar().map(str::to_string).ok_or_else(not_scalar))
                        .collect::<Result<_, _>>()?,
                    Some(ParamValue::Record(_)) => return Err(not_scalar()),
                };
                Ok(Filter::new(name, values))
            })
            .collect()
    }

    /// `TagSpecification.<i>.ResourceType` / `.Tag.<j>.Key|Value`.
    pub fn tag_specifications(&self) -> Result<Vec<TagSpecification>, ParameterError> {
        self.indexed_group("TagSpecification")?
            .into_iter()
            .map(|(index, record)| {
                let resource_type = record
                    .get("ResourceType")
                    .and_then(ParamValue::as_scalar)
                    .map(str::to_string);
                let tags = self
                    .indexed_group(&format!("TagSpecification.{index}.Tag"))?
                    .into_iter()
                    .map(|(tag_index, tag)| {
                        let field = |f: &str| tag.get(f).and_then(ParamValue::as_scalar);
                        let key = field("Key").ok_or_else(|| {
                            ParameterError::missing(format!(
                                "TagSpecification.{index}.Tag.{tag_index}.Key"
                            ))
                        })?;
                        Ok((key.to_string(), field("Value").unwrap_or_default().to_string()))
                    })
                    .collect::<Result<_, ParameterError>>()?;
                Ok(TagSpecification {
                    resource_type,
                    tags,
                })
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for RequestParams {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<'a> IntoIterator for &'a RequestParams {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
