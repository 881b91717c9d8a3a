//! The environment seed: the durable record of a completed install.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::InstallResult;
use crate::types::{InstallConfig, ProvisionedResourceMap, RunIdentity};

const USER_POOL_KEY: &str = "CognitoUserPool";
const USER_POOL_CLIENT_KEY: &str = "CognitoUserPoolClient";

/// Every identifier and endpoint the application needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSeed {
    /// Run identity.
    pub awayto_id: String,
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Environment name.
    pub environment: String,
    /// Millisecond timestamp the identity was seeded with.
    pub seed: i64,
    /// Region the environment lives in.
    pub aws_region: String,
    /// Physical name of the API function.
    pub function_name: String,
    /// User pool id.
    pub cognito_user_pool_id: String,
    /// User pool client id.
    pub cognito_client_id: String,
    /// Base URL of the API stage, with a trailing slash.
    pub api_gateway_endpoint: String,
    /// Public website URL.
    pub website: String,
}

impl EnvironmentSeed {
    /// Resolve the seed from the stack's resource map.
    ///
    /// Fails with `MissingResource` if any referenced logical name is absent.
    pub fn build(
        identity: &RunIdentity,
        install: &InstallConfig,
        region: &str,
        resources: &ProvisionedResourceMap,
    ) -> InstallResult<Self> {
        let api = resources.require(&identity.api_key())?;
        let stage = resources.require(&identity.stage_key())?;

        Ok(Self {
            awayto_id: identity.to_string(),
            name: install.name.clone(),
            description: install.description.clone(),
            environment: install.environment.clone(),
            seed: identity.timestamp_ms(),
            aws_region: region.to_owned(),
            function_name: resources.require(&identity.function_key())?.to_owned(),
            cognito_user_pool_id: resources.require(USER_POOL_KEY)?.to_owned(),
            cognito_client_id: resources.require(USER_POOL_CLIENT_KEY)?.to_owned(),
            api_gateway_endpoint: format!(
                "https://{api}.execute-api.{region}.amazonaws.com/{stage}/"
            ),
            website: identity.website_url(region),
        })
    }

    /// Path of this seed's record within `dir`.
    #[must_use]
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.awayto_id))
    }

    /// Write the seed as pretty JSON to `{dir}/{awaytoId}.json`, replacing any previous record.
    pub async fn write_to(&self, dir: &Path) -> InstallResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;

        let path = self.path_in(dir);
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json).await?;

        info!(seed = %path.display(), "environment seed written");
        Ok(path)
    }

    /// Load a seed record.
    pub async fn read_from(path: &Path) -> InstallResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use awayto_cloud::StackResource;

    use super::*;
    use crate::error::InstallError;

    fn resources(identity: &RunIdentity) -> ProvisionedResourceMap {
        ProvisionedResourceMap::from_resources([
            StackResource::new(identity.function_key(), "fn-123"),
            StackResource::new(USER_POOL_KEY, "pool-1"),
            StackResource::new(USER_POOL_CLIENT_KEY, "client-1"),
            StackResource::new(identity.api_key(), "abc123"),
            StackResource::new(identity.stage_key(), "dev"),
        ])
    }

    #[test]
    fn seed_resolves_endpoints() {
        let identity = RunIdentity::new("demo", "dev", 42);
        let seed = EnvironmentSeed::build(
            &identity,
            &InstallConfig::default(),
            "us-east-1",
            &resources(&identity),
        )
        .unwrap();

        assert_eq!(seed.awayto_id, "demodev42");
        assert_eq!(seed.seed, 42);
        assert_eq!(seed.function_name, "fn-123");
        assert_eq!(
            seed.api_gateway_endpoint,
            "https://abc123.execute-api.us-east-1.amazonaws.com/dev/"
        );
        assert_eq!(
            seed.website,
            "http://demodev42-webapp.s3-website.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn missing_resource_fails_fast() {
        let identity = RunIdentity::new("demo", "dev", 42);
        let partial = ProvisionedResourceMap::from_resources([StackResource::new(
            identity.function_key(),
            "fn-123",
        )]);

        assert!(matches!(
            EnvironmentSeed::build(&identity, &InstallConfig::default(), "us-east-1", &partial),
            Err(InstallError::MissingResource(_))
        ));
    }

    #[tokio::test]
    async fn seed_is_written_in_camel_case() {
        let dir = tempfile::TempDir::new().unwrap();
        let identity = RunIdentity::new("demo", "dev", 42);
        let seed = EnvironmentSeed::build(
            &identity,
            &InstallConfig::default(),
            "us-east-1",
            &resources(&identity),
        )
        .unwrap();

        let path = seed.write_to(&dir.path().join("seeds")).await.unwrap();
        assert!(path.ends_with("seeds/demodev42.json"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["awaytoId"], "demodev42");
        assert_eq!(raw["cognitoClientId"], "client-1");

        assert_eq!(EnvironmentSeed::read_from(&path).await.unwrap(), seed);
    }
}
