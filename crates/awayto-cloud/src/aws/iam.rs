//! IAM roles.

use async_trait::async_trait;
use aws_sdk_iam::Client;
use tracing::debug;

use super::sdk_error;
use crate::error::{CloudError, CloudResult};
use crate::traits::IdentityApi;

/// IAM backed [`IdentityApi`].
#[derive(Debug, Clone)]
pub struct AwsIdentity {
    client: Client,
}

impl AwsIdentity {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityApi for AwsIdentity {
    async fn get_role(&self, name: &str) -> CloudResult<()> {
        match self.client.get_role().role_name(name).send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_entity_exception()) =>
            {
                debug!(role = %name, "role does not exist");
                Err(CloudError::not_found("role", name))
            }
            Err(err) => Err(sdk_error("iam:GetRole", &err)),
        }
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> CloudResult<()> {
        self.client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| sdk_error("iam:CreateRole", &e))?;

        Ok(())
    }

    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> CloudResult<()> {
        self.client
            .attach_role_policy()
            .role_name(name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| sdk_error("iam:AttachRolePolicy", &e))?;

        Ok(())
    }
}
