//! Emulator configuration.
//!
//! Plain data with defaults, loadable from JSON or from `COMPUTESIM_*`
//! environment variables. [`EmulatorConfig::validate`] runs on every loader.

use std::collections::BTreeSet;
use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{AccountId, IdAllocator};
use crate::query::UnknownFilterPolicy;
use crate::storage::InMemoryResourceStore;

/// Environment variable holding the simulated account id.
pub const ENV_ACCOUNT_ID: &str = "COMPUTESIM_ACCOUNT_ID";
/// Environment variable holding the simulated region.
pub const ENV_REGION: &str = "COMPUTESIM_REGION";
/// Environment variable selecting `reject` or `ignore` for unknown filters.
pub const ENV_UNKNOWN_FILTERS: &str = "COMPUTESIM_UNKNOWN_FILTERS";
/// Environment variable listing denied actions, comma separated.
pub const ENV_DENIED_ACTIONS: &str = "COMPUTESIM_DENIED_ACTIONS";
/// Environment variable holding a u64 seed for deterministic ids.
pub const ENV_ID_SEED: &str = "COMPUTESIM_ID_SEED";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting failed validation.
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Value as given.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The JSON document does not parse.
    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Settings for one emulator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Simulated account owning every resource.
    pub account_id: String,
    /// Simulated region, echoed to handlers.
    pub region: String,
    /// Default handling of unrecognized filter names.
    pub unknown_filters: UnknownFilterPolicy,
    /// Actions the simulated principal may not perform.
    pub denied_actions: BTreeSet<String>,
    /// Seed for deterministic id allocation.
    pub id_seed: Option<u64>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            account_id: AccountId::default().as_str().to_string(),
            region: "us-east-1".to_string(),
            unknown_filters: UnknownFilterPolicy::Reject,
            denied_actions: BTreeSet::new(),
            id_seed: None,
        }
    }
}

impl EmulatorConfig {
    /// Checks field values.
    ///
    /// # Errors
    /// - `InvalidValue`: the account id is not 12 digits or the region is empty
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.account_id.len() != 12 || !self.account_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::invalid(
                "account_id",
                &self.account_id,
                "expected 12 digits",
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::invalid("region", &self.region, "must not be empty"));
        }
        Ok(self)
    }

    /// Parses and validates a JSON document; missing fields take defaults.
    ///
    /// # Errors
    /// - `Json`: the document is not valid JSON for this shape
    /// - `InvalidValue`: see [`EmulatorConfig::validate`]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    /// Reads `COMPUTESIM_*` variables from the process environment.
    ///
    /// # Errors
    /// - `InvalidValue`: a variable could not be parsed or failed validation
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`EmulatorConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    /// - `InvalidValue`: a variable could not be parsed or failed validation
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(account_id) = lookup(ENV_ACCOUNT_ID) {
            config.account_id = account_id.trim().to_string();
        }
        if let Some(region) = lookup(ENV_REGION) {
            config.region = region.trim().to_string();
        }
        if let Some(policy) = lookup(ENV_UNKNOWN_FILTERS) {
            config.unknown_filters = match policy.trim().to_ascii_lowercase().as_str() {
                "reject" => UnknownFilterPolicy::Reject,
                "ignore" => UnknownFilterPolicy::Ignore,
                _ => {
                    return Err(ConfigError::invalid(
                        ENV_UNKNOWN_FILTERS,
                        &policy,
                        "expected 'reject' or 'ignore'",
                    ))
                }
            };
        }
        if let Some(denied) = lookup(ENV_DENIED_ACTIONS) {
            config.denied_actions = denied
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(seed) = lookup(ENV_ID_SEED) {
            let parsed = seed
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::invalid(ENV_ID_SEED, &seed, "expected an unsigned integer"))?;
            config.id_seed = Some(parsed);
        }
        config.validate()
    }

    /// Id allocator honoring `id_seed`.
    #[must_use]
    pub fn id_allocator(&self) -> IdAllocator {
        self.id_seed.map_or_else(IdAllocator::new, IdAllocator::seeded)
    }

    /// Empty store for the configured account.
    #[must_use]
    pub fn build_store(&self) -> InMemoryResourceStore {
        InMemoryResourceStore::for_account(AccountId::new(self.account_id.clone()))
            .with_allocator(self.id_allocator())
    }
}
