//! Stack submission, completion wait and resource extraction.

use std::collections::BTreeMap;
use std::sync::Arc;

use awayto_cloud::{CreateStack, StackApi, StackState};
use tracing::{info, warn};

use crate::error::{InstallError, InstallResult};
use crate::poller::Poller;
use crate::types::{ProvisionedResourceMap, RunIdentity};

const CAPABILITIES: [&str; 3] = [
    "CAPABILITY_IAM",
    "CAPABILITY_NAMED_IAM",
    "CAPABILITY_AUTO_EXPAND",
];

/// Where a stack status sits in its creation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStatusKind {
    /// Creation finished successfully.
    Complete,
    /// Still being created.
    Pending,
    /// Failed, rolling back or being deleted. Will never complete.
    Failed,
}

impl StackStatusKind {
    /// Classify a provider status string, ignoring case.
    #[must_use]
    pub fn classify(status: &str) -> Self {
        let status = status.to_ascii_uppercase();

        if status == "CREATE_COMPLETE" {
            Self::Complete
        } else if status.contains("FAILED")
            || status.contains("ROLLBACK")
            || status.starts_with("DELETE")
        {
            Self::Failed
        } else {
            Self::Pending
        }
    }
}

/// Submits the infrastructure stack and waits for it.
pub struct StackDeployer {
    stacks: Arc<dyn StackApi>,
    poller: Poller,
}

impl StackDeployer {
    /// Create a deployer.
    #[must_use]
    pub fn new(stacks: Arc<dyn StackApi>, poller: Poller) -> Self {
        Self { stacks, poller }
    }

    /// Submit stack creation for the template uploaded to the staging bucket.
    ///
    /// The stack is deleted by the provider if creation fails.
    pub async fn deploy_stack(
        &self,
        identity: &RunIdentity,
        template_url: &str,
        environment: &str,
    ) -> InstallResult<String> {
        let request = CreateStack {
            name: identity.to_string(),
            template_url: template_url.to_owned(),
            capabilities: CAPABILITIES.iter().map(|c| (*c).to_owned()).collect(),
            on_failure: "DELETE".to_owned(),
            parameters: BTreeMap::from([("Environment".to_owned(), environment.to_owned())]),
        };

        info!(stack = %identity, template = %template_url, "creating stack");
        let stack_id = self.stacks.create_stack(&request).await?;
        Ok(stack_id)
    }

    /// Wait until the stack reports `CREATE_COMPLETE`.
    ///
    /// A failed, rolled back or deleted stack ends the wait with
    /// [`InstallError::StackFailed`].
    pub async fn await_completion(&self, identity: &RunIdentity) -> InstallResult<StackState> {
        let name = identity.as_str();
        let stacks = &self.stacks;

        let state = self
            .poller
            .wait_for(
                "stack",
                move || stacks.describe_stack(name),
                |state: &StackState| match StackStatusKind::classify(&state.status) {
                    StackStatusKind::Complete => Ok(true),
                    StackStatusKind::Pending => Ok(false),
                    StackStatusKind::Failed => {
                        warn!(stack = %state.name, status = %state.status, "stack failed");
                        Err(InstallError::StackFailed {
                            stack: state.name.clone(),
                            status: state.status.clone(),
                            reason: state.reason.clone(),
                        })
                    }
                },
            )
            .await?;

        info!(stack = %identity, "stack created");
        Ok(state)
    }

    /// List the stack's resources as a logical to physical map.
    pub async fn extract_resource_map(
        &self,
        identity: &RunIdentity,
    ) -> InstallResult<ProvisionedResourceMap> {
        let resources = self.stacks.list_resources(identity.as_str()).await?;
        let map = ProvisionedResourceMap::from_resources(resources);
        info!(stack = %identity, resources = map.len(), "stack resources listed");
        Ok(map)
    }
}
