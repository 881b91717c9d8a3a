//! Core types for awayto-install.

use std::collections::BTreeMap;
use std::fmt;

use awayto_cloud::StackResource;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InstallError, InstallResult};

/// Bucket names may not exceed 63 characters and the longest suffix is `-webapp`.
pub const MAX_IDENTITY_LEN: usize = 56;

/// Millisecond timestamps stay at 13 digits until the year 2286.
const TIMESTAMP_DIGITS: usize = 13;

/// Base name for every cloud resource created by one run.
///
/// Formed as `{project}{environment}{timestamp_ms}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    id: String,
    timestamp_ms: i64,
}

impl RunIdentity {
    /// Build an identity from its parts.
    #[must_use]
    pub fn new(project: &str, environment: &str, timestamp_ms: i64) -> Self {
        Self {
            id: format!("{project}{environment}{timestamp_ms}"),
            timestamp_ms,
        }
    }

    /// Generate an identity seeded with the current time.
    #[must_use]
    pub fn generate(project: &str, environment: &str) -> Self {
        Self::new(project, environment, Utc::now().timestamp_millis())
    }

    /// Get the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Millisecond timestamp the identity was seeded with.
    #[must_use]
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Seed time as a UTC datetime, when representable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// Bucket staging the template and function code.
    #[must_use]
    pub fn lambda_bucket(&self) -> String {
        format!("{}-lambda", self.id)
    }

    /// Bucket hosting the static website.
    #[must_use]
    pub fn webapp_bucket(&self) -> String {
        format!("{}-webapp", self.id)
    }

    /// Parameter store key for a base name, e.g. `PGHOST_{id}`.
    #[must_use]
    pub fn parameter_name(&self, base: &str) -> String {
        format!("{base}_{}", self.id)
    }

    /// URL of the uploaded infrastructure template.
    #[must_use]
    pub fn template_url(&self) -> String {
        format!("https://{}.s3.amazonaws.com/template.yaml", self.lambda_bucket())
    }

    /// Public website URL in a region.
    #[must_use]
    pub fn website_url(&self, region: &str) -> String {
        format!("http://{}.s3-website.{region}.amazonaws.com", self.webapp_bucket())
    }

    /// Logical name of the compute function in the stack.
    #[must_use]
    pub fn function_key(&self) -> String {
        format!("{}Resource", self.id)
    }

    /// Logical name of the API gateway in the stack.
    #[must_use]
    pub fn api_key(&self) -> String {
        format!("{}ResourceApi", self.id)
    }

    /// Logical name of the API gateway stage in the stack.
    #[must_use]
    pub fn stage_key(&self) -> String {
        format!("{}ResourceApiStage", self.id)
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl AsRef<str> for RunIdentity {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

/// Values describing the environment to install. Immutable for a run.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Project name, lowercase alphanumeric.
    pub name: String,
    /// Free-form project description.
    pub description: String,
    /// Environment name, lowercase alphanumeric.
    pub environment: String,
    /// Database master username.
    pub db_username: String,
    /// Database master password.
    pub db_password: String,
    /// Index into the configured region list.
    pub region_index: usize,
    /// Index into the availability zones of the selected region.
    pub zone_index: usize,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            name: "awayto".to_owned(),
            description:
                "Awayto is a workflow enhancing platform, producing great value with minimal investment."
                    .to_owned(),
            environment: "dev".to_owned(),
            db_username: "postgres".to_owned(),
            db_password: "postgres".to_owned(),
            region_index: 0,
            zone_index: 0,
        }
    }
}

impl fmt::Debug for InstallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallConfig")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("environment", &self.environment)
            .field("db_username", &self.db_username)
            .field("db_password", &"<redacted>")
            .field("region_index", &self.region_index)
            .field("zone_index", &self.zone_index)
            .finish()
    }
}

impl InstallConfig {
    /// Reject values that would produce invalid resource names or credentials.
    pub fn validate(&self) -> InstallResult<()> {
        validate_name("name", &self.name)?;
        if !self.name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(InstallError::invalid("name", "must start with a letter"));
        }
        validate_name("environment", &self.environment)?;

        let id_len = self.name.len() + self.environment.len() + TIMESTAMP_DIGITS;
        if id_len > MAX_IDENTITY_LEN {
            return Err(InstallError::invalid(
                "name",
                format!(
                    "name and environment together must be at most {} characters",
                    MAX_IDENTITY_LEN - TIMESTAMP_DIGITS
                ),
            ));
        }

        if !self
            .db_username
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        {
            return Err(InstallError::invalid("db_username", "must start with a letter"));
        }
        if !self
            .db_username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(InstallError::invalid(
                "db_username",
                "may only contain letters, digits and underscores",
            ));
        }

        if self.db_password.len() < 8 {
            return Err(InstallError::invalid(
                "db_password",
                "must be at least 8 characters",
            ));
        }
        if let Some(c) = self.db_password.chars().find(|c| matches!(c, '@' | '"' | '/')) {
            return Err(InstallError::invalid(
                "db_password",
                format!("may not contain {c}"),
            ));
        }

        Ok(())
    }

    /// Identity for a run of this configuration seeded with the current time.
    #[must_use]
    pub fn identity(&self) -> RunIdentity {
        RunIdentity::generate(&self.name, &self.environment)
    }
}

fn validate_name(field: &'static str, value: &str) -> InstallResult<()> {
    if value.is_empty() {
        return Err(InstallError::invalid(field, "must not be empty"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(InstallError::invalid(
            field,
            "may only contain lowercase letters and digits",
        ));
    }
    Ok(())
}

/// Map a region index to its name.
pub fn resolve_region(regions: &[String], index: usize) -> InstallResult<&str> {
    regions
        .get(index)
        .map(String::as_str)
        .ok_or(InstallError::UnknownRegion {
            index,
            available: regions.len(),
        })
}

/// Logical resource name to physical identifier, as listed by a completed stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProvisionedResourceMap(BTreeMap<String, String>);

impl ProvisionedResourceMap {
    /// Fold listed stack resources into a map keyed by logical name.
    #[must_use]
    pub fn from_resources(resources: impl IntoIterator<Item = StackResource>) -> Self {
        Self(
            resources
                .into_iter()
                .map(|r| (r.logical_id, r.physical_id))
                .collect(),
        )
    }

    /// Physical identifier of a logical resource.
    #[must_use]
    pub fn get(&self, logical_id: &str) -> Option<&str> {
        self.0.get(logical_id).map(String::as_str)
    }

    /// Physical identifier of a logical resource that must exist.
    pub fn require(&self, logical_id: &str) -> InstallResult<&str> {
        self.get(logical_id)
            .ok_or_else(|| InstallError::MissingResource(logical_id.to_owned()))
    }

    /// Number of mapped resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no resources were mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn demo() -> InstallConfig {
        InstallConfig {
            name: "demo".to_owned(),
            environment: "dev".to_owned(),
            db_password: "postgres1".to_owned(),
            ..InstallConfig::default()
        }
    }

    #[test]
    fn identity_is_deterministic_for_a_timestamp() {
        let a = RunIdentity::new("demo", "dev", 1_700_000_000_000);
        let b = RunIdentity::new("demo", "dev", 1_700_000_000_000);
        let c = RunIdentity::new("demo", "dev", 1_700_000_000_001);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "demodev1700000000000");
        assert!(a.created_at().is_some());
    }

    #[test]
    fn identity_names_resources() {
        let id = RunIdentity::new("demo", "dev", 1);
        assert_eq!(id.lambda_bucket(), "demodev1-lambda");
        assert_eq!(id.webapp_bucket(), "demodev1-webapp");
        assert_eq!(id.parameter_name("PGHOST"), "PGHOST_demodev1");
        assert_eq!(
            id.template_url(),
            "https://demodev1-lambda.s3.amazonaws.com/template.yaml"
        );
        assert_eq!(
            id.website_url("eu-west-1"),
            "http://demodev1-webapp.s3-website.eu-west-1.amazonaws.com"
        );
        assert_eq!(id.function_key(), "demodev1Resource");
        assert_eq!(id.stage_key(), "demodev1ResourceApiStage");
    }

    #[test]
    fn valid_config_passes() {
        demo().validate().unwrap();
    }

    #[test]
    fn names_must_be_lowercase_alphanumeric() {
        let config = InstallConfig {
            name: "My-App".to_owned(),
            ..demo()
        };
        assert!(matches!(
            config.validate(),
            Err(InstallError::InvalidInput { field: "name", .. })
        ));
    }

    #[test]
    fn long_identity_is_rejected() {
        let config = InstallConfig {
            name: "a".repeat(41),
            ..demo()
        };
        assert!(matches!(
            config.validate(),
            Err(InstallError::InvalidInput { field: "name", .. })
        ));
    }

    #[test]
    fn identity_at_the_length_limit_is_accepted() {
        let config = InstallConfig {
            name: "a".repeat(40),
            ..demo()
        };
        config.validate().unwrap();
        assert_eq!(config.identity().as_str().len(), MAX_IDENTITY_LEN);
    }

    #[test]
    fn name_must_start_with_a_letter() {
        let config = InstallConfig {
            name: "1app".to_owned(),
            ..demo()
        };
        assert!(matches!(
            config.validate(),
            Err(InstallError::InvalidInput { field: "name", .. })
        ));

        let config = InstallConfig {
            environment: "2024".to_owned(),
            ..demo()
        };
        config.validate().unwrap();
    }

    #[test]
    fn credentials_are_checked() {
        let username = InstallConfig {
            db_username: "1admin".to_owned(),
            ..demo()
        };
        assert!(matches!(
            username.validate(),
            Err(InstallError::InvalidInput { field: "db_username", .. })
        ));

        let short = InstallConfig {
            db_password: "short".to_owned(),
            ..demo()
        };
        assert!(short.validate().is_err());

        let slash = InstallConfig {
            db_password: "pass/word1".to_owned(),
            ..demo()
        };
        assert!(matches!(
            slash.validate(),
            Err(InstallError::InvalidInput { field: "db_password", .. })
        ));
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let output = format!("{:?}", demo());
        assert!(!output.contains("postgres1"));
    }

    #[test]
    fn region_index_resolves() {
        let regions = vec!["us-east-1".to_owned(), "eu-west-1".to_owned()];
        assert_eq!(resolve_region(&regions, 0).unwrap(), "us-east-1");
        assert!(matches!(
            resolve_region(&regions, 5),
            Err(InstallError::UnknownRegion { index: 5, available: 2 })
        ));
    }

    #[test]
    fn resource_map_requires_keys() {
        let map = ProvisionedResourceMap::from_resources([
            StackResource::new("demoResource", "fn-123"),
            StackResource::new("CognitoUserPool", "pool-1"),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.require("demoResource").unwrap(), "fn-123");
        assert!(matches!(
            map.require("CognitoUserPoolClient"),
            Err(InstallError::MissingResource(key)) if key == "CognitoUserPoolClient"
        ));
    }
}
