//! SSM parameter store.

use async_trait::async_trait;
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client;

use super::sdk_error;
use crate::error::CloudResult;
use crate::traits::ParameterStore;
use crate::types::Parameter;

/// SSM backed [`ParameterStore`].
#[derive(Debug, Clone)]
pub struct AwsParameters {
    client: Client,
}

impl AwsParameters {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for AwsParameters {
    async fn put_parameter(&self, parameter: &Parameter) -> CloudResult<()> {
        self.client
            .put_parameter()
            .name(&parameter.name)
            .value(&parameter.value)
            .data_type("text")
            .r#type(ParameterType::String)
            .overwrite(parameter.overwrite)
            .send()
            .await
            .map_err(|e| sdk_error("ssm:PutParameter", &e))?;

        Ok(())
    }
}
