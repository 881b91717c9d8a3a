//! EC2 availability zones.

use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client;

use super::sdk_error;
use crate::error::CloudResult;
use crate::traits::ZoneApi;

/// EC2 backed [`ZoneApi`].
#[derive(Debug, Clone)]
pub struct AwsZones {
    client: Client,
}

impl AwsZones {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ZoneApi for AwsZones {
    async fn availability_zones(&self, region: &str) -> CloudResult<Vec<String>> {
        let response = self
            .client
            .describe_availability_zones()
            .filters(Filter::builder().name("region-name").values(region).build())
            .send()
            .await
            .map_err(|e| sdk_error("ec2:DescribeAvailabilityZones", &e))?;

        Ok(response
            .availability_zones()
            .iter()
            .filter_map(|zone| zone.zone_name())
            .map(str::to_owned)
            .collect())
    }
}
