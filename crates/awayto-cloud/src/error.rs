//! Error types for cloud provider calls.

use thiserror::Error;

/// Result type alias using [`CloudError`].
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors returned by the provider seams.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The addressed resource does not exist.
    ///
    /// This is the only variant callers may treat as an expected branch
    /// (for example "create the role if absent"). Authorisation and network
    /// failures never map here.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Resource kind, e.g. `role`.
        kind: &'static str,
        /// Resource name as requested.
        name: String,
    },

    /// The provider rejected or failed the call.
    #[error("{operation} failed: {message}")]
    Service {
        /// Provider operation, e.g. `rds:CreateDBInstance`.
        operation: &'static str,
        /// Provider error message with context.
        message: String,
    },

    /// A response was missing a field the caller depends on.
    #[error("{operation} returned no {field}")]
    MissingField {
        /// Provider operation.
        operation: &'static str,
        /// Missing field name.
        field: &'static str,
    },

    /// A request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CloudError {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a service error.
    #[must_use]
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }

    /// Create a missing-field error.
    #[must_use]
    pub const fn missing(operation: &'static str, field: &'static str) -> Self {
        Self::MissingField { operation, field }
    }

    /// Whether this error is the distinguished not-found condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
