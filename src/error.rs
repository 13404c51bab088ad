//! Error types for computesim.
//!
//! All errors are strongly typed using thiserror. Every condition raised by the
//! core carries one symbolic kind plus a human-readable message; the transport
//! layer maps [`ApiError::code`] and [`ApiError::http_status`] onto the wire.
//!
//! Dry-run outcomes travel through the same channel as faults but are not
//! faults: [`ApiError::is_dry_run_outcome`] separates "would have succeeded or
//! failed" from genuine errors.

use thiserror::Error;

use crate::id::ResourceId;
use crate::resource::ResourceKind;

/// Message the target API returns for a permitted dry run.
pub const DRY_RUN_MESSAGE: &str = "Request would have succeeded, but DryRun flag is set.";

/// Message the target API returns when the caller lacks permission.
pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized to perform this operation.";

/// Malformed request input. Never retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// An index segment is zero or not a number.
    #[error("Invalid index segment '{segment}' in parameter '{key}'")]
    InvalidIndex {
        /// Offending key as sent.
        key: String,
        /// Offending segment.
        segment: String,
    },

    /// A key does not fit the dotted encoding.
    #[error("Malformed parameter '{key}': {reason}")]
    MalformedKey {
        /// Offending key as sent.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A key is both a scalar and a parent of other keys.
    #[error("Parameter '{key}' conflicts with another parameter of the same path")]
    ConflictingKey {
        /// Offending key as sent.
        key: String,
    },

    /// A required parameter is absent.
    #[error("The request must contain the parameter {name}")]
    MissingParameter {
        /// Missing parameter name.
        name: String,
    },

    /// A value does not parse or is out of range.
    #[error("Value '{value}' for parameter {name} is invalid: {reason}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Value as sent.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A resource was built without a required attribute.
    #[error("Resource of type {kind} is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Resource kind.
        kind: String,
        /// Missing attribute name.
        attribute: String,
    },
}

impl ParameterError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid_value(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-parameter error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Wire error code for this parameter error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "MissingParameter",
            _ => "InvalidParameterValue",
        }
    }
}

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The id was removed earlier and may not be reused.
    #[error("Resource id {0} was retired and cannot be reused")]
    RetiredId(ResourceId),

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot file could not be read or written.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type returned by every dispatch.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request input.
    #[error("{0}")]
    Parameter(#[from] ParameterError),

    /// A referenced resource does not exist.
    #[error("The {kind} ID '{id}' does not exist")]
    NotFound {
        /// Kind the id was expected to name.
        kind: ResourceKind,
        /// Id as sent.
        id: String,
    },

    /// A continuation token does not parse.
    #[error("The pagination token '{token}' is invalid")]
    InvalidToken {
        /// Token as sent.
        token: String,
    },

    /// No handler is registered for the action.
    #[error("The action {action} is not valid for this web service")]
    UnsupportedAction {
        /// Action name as sent.
        action: String,
    },

    /// Dry run that would have succeeded.
    #[error("Request would have succeeded, but DryRun flag is set.")]
    DryRunOperation,

    /// Dry run by a caller without permission.
    #[error("You are not authorized to perform this operation.")]
    UnauthorizedOperation,

    /// Store backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invariant violation inside a handler.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a typed not-found error for a missing id.
    #[must_use]
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wire error code, following the target API's naming.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Parameter(e) => e.code().to_string(),
            Self::NotFound { kind, .. } => kind.not_found_code(),
            Self::InvalidToken { .. } => "InvalidPaginationToken".to_string(),
            Self::UnsupportedAction { .. } => "InvalidAction".to_string(),
            Self::DryRunOperation => "DryRunOperation".to_string(),
            Self::UnauthorizedOperation => "UnauthorizedOperation".to_string(),
            Self::Storage(_) | Self::Internal { .. } => "InternalError".to_string(),
        }
    }

    /// HTTP status the transport should report.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::UnauthorizedOperation => 403,
            Self::Storage(_) | Self::Internal { .. } => 500,
            _ => 400,
        }
    }

    /// Returns true for the two dry-run outcomes.
    #[must_use]
    pub const fn is_dry_run_outcome(&self) -> bool {
        matches!(self, Self::DryRunOperation | Self::UnauthorizedOperation)
    }

    /// Returns true if this is a genuine fault rather than a dry-run signal.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        !self.is_dry_run_outcome()
    }

    /// Returns true if this is a parameter error.
    #[must_use]
    pub const fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    /// Returns true if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for the internal class (storage and internal errors).
    ///
    /// Client errors, not-found errors and dry-run outcomes are never
    /// retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Internal { .. })
    }
}

/// Result type alias for computesim operations.
pub type ApiResult<T> = Result<T, ApiError>;
