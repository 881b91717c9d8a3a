//! Lambda functions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, InvocationType};
use aws_sdk_lambda::Client;
use tracing::debug;

use super::sdk_error;
use crate::error::CloudResult;
use crate::traits::FunctionApi;
use crate::types::FunctionConfiguration;

/// Lambda backed [`FunctionApi`].
#[derive(Debug, Clone)]
pub struct AwsFunctions {
    client: Client,
}

impl AwsFunctions {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionApi for AwsFunctions {
    async fn get_configuration(&self, name: &str) -> CloudResult<FunctionConfiguration> {
        let response = self
            .client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
            .map_err(|e| sdk_error("lambda:GetFunctionConfiguration", &e))?;

        let environment = response
            .environment()
            .and_then(|env| env.variables())
            .map(|vars| {
                vars.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Ok(FunctionConfiguration {
            name: name.to_owned(),
            environment,
        })
    }

    async fn update_environment(
        &self,
        name: &str,
        variables: &BTreeMap<String, String>,
    ) -> CloudResult<()> {
        let environment = Environment::builder()
            .set_variables(Some(
                variables
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ))
            .build();

        self.client
            .update_function_configuration()
            .function_name(name)
            .environment(environment)
            .send()
            .await
            .map_err(|e| sdk_error("lambda:UpdateFunctionConfiguration", &e))?;

        debug!(function = %name, count = variables.len(), "environment replaced");
        Ok(())
    }

    async fn update_code(&self, name: &str, bucket: &str, key: &str) -> CloudResult<()> {
        self.client
            .update_function_code()
            .function_name(name)
            .s3_bucket(bucket)
            .s3_key(key)
            .send()
            .await
            .map_err(|e| sdk_error("lambda:UpdateFunctionCode", &e))?;

        Ok(())
    }

    async fn invoke_event(&self, name: &str, payload: Vec<u8>) -> CloudResult<()> {
        self.client
            .invoke()
            .function_name(name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| sdk_error("lambda:Invoke", &e))?;

        Ok(())
    }
}
