//! Error types for awayto-install.

use awayto_cloud::CloudError;

use crate::steps::StepName;

/// Result type alias using [`InstallError`].
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur during an install run.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Provider call failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Install configuration value rejected.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Region index outside the configured region list.
    #[error("region index {index} out of range (0..{available})")]
    UnknownRegion {
        /// Requested index.
        index: usize,
        /// Number of configured regions.
        available: usize,
    },

    /// Availability zone index outside the zones reported for the region.
    #[error("availability zone index {index} out of range for {region} ({available} zones)")]
    UnknownZone {
        /// Region the zones were listed for.
        region: String,
        /// Requested index.
        index: usize,
        /// Number of zones reported.
        available: usize,
    },

    /// No orderable database offering matched the configured class and storage.
    #[error("no {engine} offering for {instance_class} with {storage_type} storage")]
    NoOffering {
        /// Engine name.
        engine: String,
        /// Instance class.
        instance_class: String,
        /// Storage type.
        storage_type: String,
    },

    /// Stack reached a terminal failure status.
    #[error("stack {stack} failed with status {status}{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    StackFailed {
        /// Stack name.
        stack: String,
        /// Terminal status.
        status: String,
        /// Provider reason, if any.
        reason: Option<String>,
    },

    /// A logical resource expected in the stack was not created.
    #[error("stack resource missing: {0}")]
    MissingResource(String),

    /// Database instance became available without an endpoint.
    #[error("database {0} has no endpoint")]
    MissingEndpoint(String),

    /// Template tokens were left without a value.
    #[error("unresolved template tokens: {}", .tokens.join(", "))]
    UnresolvedTokens {
        /// Distinct unresolved token names.
        tokens: Vec<String>,
    },

    /// A status query failed while waiting on a resource.
    #[error("status query for {resource} failed")]
    StatusQuery {
        /// Resource being waited on.
        resource: String,
        /// Underlying query error.
        source: Box<InstallError>,
    },

    /// Archive could not be written.
    #[error("archive error: {0}")]
    Archive(String),

    /// Local step command failed.
    #[error("{step} failed: {message}")]
    Command {
        /// Step that ran the command.
        step: StepName,
        /// Failure description.
        message: String,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),
}

impl InstallError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an input validation error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error ends the run regardless of the step's failure policy.
    #[must_use]
    pub const fn is_always_fatal(&self) -> bool {
        matches!(self, Self::StatusQuery { .. } | Self::Archive(_))
    }

    /// Create an archive error.
    #[must_use]
    pub fn archive(msg: impl std::fmt::Display) -> Self {
        Self::Archive(msg.to_string())
    }
}

impl From<zip::result::ZipError> for InstallError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::archive(err)
    }
}

impl From<serde_json::Error> for InstallError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialisation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_failure_message_includes_reason() {
        let err = InstallError::StackFailed {
            stack: "demodev1".to_owned(),
            status: "ROLLBACK_COMPLETE".to_owned(),
            reason: Some("Resource creation cancelled".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "stack demodev1 failed with status ROLLBACK_COMPLETE: Resource creation cancelled"
        );
    }

    #[test]
    fn status_query_and_archive_errors_are_always_fatal() {
        let query = InstallError::StatusQuery {
            resource: "database".to_owned(),
            source: Box::new(CloudError::service("rds:DescribeDBInstances", "AccessDenied").into()),
        };
        assert!(query.is_always_fatal());
        assert!(InstallError::archive("stream closed").is_always_fatal());
        assert!(!InstallError::config("x").is_always_fatal());
        assert!(!InstallError::Command {
            step: StepName::BuildApplication,
            message: "exit 1".to_owned(),
        }
        .is_always_fatal());
    }

    #[test]
    fn unresolved_tokens_are_listed() {
        let err = InstallError::UnresolvedTokens {
            tokens: vec!["id".to_owned(), "region".to_owned()],
        };
        assert_eq!(err.to_string(), "unresolved template tokens: id, region");
    }
}
