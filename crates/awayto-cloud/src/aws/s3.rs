//! S3 buckets and objects.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, IndexDocument, WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use tracing::debug;

use super::sdk_error;
use crate::error::{CloudError, CloudResult};
use crate::traits::ObjectStorage;

/// Region where buckets are created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 backed [`ObjectStorage`].
#[derive(Debug, Clone)]
pub struct AwsStorage {
    client: Client,
    region: Option<String>,
}

impl AwsStorage {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
            region: config.region().map(|r| r.as_ref().to_owned()),
        }
    }

    fn location_constraint(&self) -> Option<CreateBucketConfiguration> {
        let region = self.region.as_deref().filter(|r| *r != DEFAULT_REGION)?;
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        )
    }
}

#[async_trait]
impl ObjectStorage for AwsStorage {
    async fn create_bucket(&self, bucket: &str) -> CloudResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.location_constraint())
            .send()
            .await
            .map_err(|e| sdk_error("s3:CreateBucket", &e))?;

        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error("s3:PutObject", &e))?;

        debug!(bucket = %bucket, key = %key, size, "object stored");
        Ok(())
    }

    async fn put_bucket_website(&self, bucket: &str, index_document: &str) -> CloudResult<()> {
        let index = IndexDocument::builder()
            .suffix(index_document)
            .build()
            .map_err(|e| CloudError::InvalidRequest(e.to_string()))?;

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(WebsiteConfiguration::builder().index_document(index).build())
            .send()
            .await
            .map_err(|e| sdk_error("s3:PutBucketWebsite", &e))?;

        Ok(())
    }

    async fn allow_public_policy(&self, bucket: &str) -> CloudResult<()> {
        self.client
            .delete_public_access_block()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| sdk_error("s3:DeletePublicAccessBlock", &e))?;

        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> CloudResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| sdk_error("s3:PutBucketPolicy", &e))?;

        Ok(())
    }
}
