//! CloudFormation stacks.

use async_trait::async_trait;
use aws_sdk_cloudformation::types::{Capability, OnFailure, Parameter, StackStatus};
use aws_sdk_cloudformation::Client;
use tracing::debug;

use super::{field, sdk_error};
use crate::error::{CloudError, CloudResult};
use crate::traits::StackApi;
use crate::types::{CreateStack, StackResource, StackState};

/// CloudFormation backed [`StackApi`].
#[derive(Debug, Clone)]
pub struct AwsStacks {
    client: Client,
}

impl AwsStacks {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl StackApi for AwsStacks {
    async fn create_stack(&self, request: &CreateStack) -> CloudResult<String> {
        let capabilities = request
            .capabilities
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect();

        let parameters = request
            .parameters
            .iter()
            .map(|(key, value)| {
                Parameter::builder()
                    .parameter_key(key)
                    .parameter_value(value)
                    .build()
            })
            .collect();

        let response = self
            .client
            .create_stack()
            .stack_name(&request.name)
            .template_url(&request.template_url)
            .set_capabilities(Some(capabilities))
            .on_failure(OnFailure::from(request.on_failure.as_str()))
            .set_parameters(Some(parameters))
            .send()
            .await
            .map_err(|e| sdk_error("cloudformation:CreateStack", &e))?;

        Ok(response
            .stack_id()
            .map_or_else(|| request.name.clone(), str::to_owned))
    }

    async fn describe_stack(&self, name: &str) -> CloudResult<StackState> {
        const OPERATION: &str = "cloudformation:DescribeStacks";

        let response = self
            .client
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| sdk_error(OPERATION, &e))?;

        let stack = response
            .stacks()
            .first()
            .ok_or_else(|| CloudError::missing(OPERATION, "stack"))?;

        let status = field::<StackStatus>(stack.stack_status())
            .ok_or_else(|| CloudError::missing(OPERATION, "status"))?;

        Ok(StackState {
            name: name.to_owned(),
            status: status.as_str().to_owned(),
            reason: stack.stack_status_reason().map(str::to_owned),
        })
    }

    async fn list_resources(&self, name: &str) -> CloudResult<Vec<StackResource>> {
        let mut resources = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_stack_resources()
                .stack_name(name)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("cloudformation:ListStackResources", &e))?;

            for summary in response.stack_resource_summaries() {
                let logical = field::<str>(summary.logical_resource_id());
                match (logical, summary.physical_resource_id()) {
                    (Some(logical), Some(physical)) => {
                        resources.push(StackResource::new(logical, physical));
                    }
                    (logical, _) => {
                        debug!(stack = %name, logical = ?logical, "skipping resource without physical id");
                    }
                }
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }

        Ok(resources)
    }
}
