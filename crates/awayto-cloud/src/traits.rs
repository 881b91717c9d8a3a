//! Traits for provider API implementations.
//!
//! Each trait covers exactly the calls the installer issues against one
//! provider service. Implementations must not retry on their own; retry and
//! wait policy belongs to the caller.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CloudResult;
use crate::types::{
    CreateDbInstance, CreateStack, DbInstanceOffering, DbInstanceState, FunctionConfiguration,
    Parameter, StackResource, StackState,
};

/// Relational database instance lifecycle.
#[async_trait]
pub trait DatabaseApi: Send + Sync {
    /// Lists every orderable offering for an engine.
    async fn orderable_offerings(&self, engine: &str) -> CloudResult<Vec<DbInstanceOffering>>;

    /// Starts creating an instance. Returns as soon as the request is accepted.
    async fn create_instance(&self, request: &CreateDbInstance) -> CloudResult<()>;

    /// Changes the master password. Completion is not awaited.
    async fn modify_master_password(&self, identifier: &str, password: &str) -> CloudResult<()>;

    /// Describes the current state of an instance.
    async fn describe_instance(&self, identifier: &str) -> CloudResult<DbInstanceState>;
}

/// Composite infrastructure stacks.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Submits a stack for creation and returns the provider stack id.
    async fn create_stack(&self, request: &CreateStack) -> CloudResult<String>;

    /// Describes the current state of a stack.
    async fn describe_stack(&self, name: &str) -> CloudResult<StackState>;

    /// Lists every resource of a stack.
    async fn list_resources(&self, name: &str) -> CloudResult<Vec<StackResource>>;
}

/// Key-value parameter store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Writes a plain-text parameter.
    async fn put_parameter(&self, parameter: &Parameter) -> CloudResult<()>;
}

/// Identity and access management.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Looks up a role by name.
    ///
    /// Returns [`CloudError::NotFound`](crate::CloudError::NotFound) when the
    /// role does not exist and a service error for anything else.
    async fn get_role(&self, name: &str) -> CloudResult<()>;

    /// Creates a role with the given trust policy document.
    async fn create_role(&self, name: &str, trust_policy: &str) -> CloudResult<()>;

    /// Attaches a managed policy to a role.
    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> CloudResult<()>;
}

/// Object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Creates a bucket.
    async fn create_bucket(&self, bucket: &str) -> CloudResult<()>;

    /// Stores an object.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()>;

    /// Configures a bucket as a static website with the given index document.
    async fn put_bucket_website(&self, bucket: &str, index_document: &str) -> CloudResult<()>;

    /// Removes the public access block so a public bucket policy can apply.
    async fn allow_public_policy(&self, bucket: &str) -> CloudResult<()>;

    /// Replaces the bucket policy.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> CloudResult<()>;
}

/// Compute function management.
#[async_trait]
pub trait FunctionApi: Send + Sync {
    /// Reads the function configuration.
    async fn get_configuration(&self, name: &str) -> CloudResult<FunctionConfiguration>;

    /// Replaces the full environment variable set.
    async fn update_environment(
        &self,
        name: &str,
        variables: &BTreeMap<String, String>,
    ) -> CloudResult<()>;

    /// Points the function code at an object in storage.
    async fn update_code(&self, name: &str, bucket: &str, key: &str) -> CloudResult<()>;

    /// Invokes the function without waiting for its response.
    async fn invoke_event(&self, name: &str, payload: Vec<u8>) -> CloudResult<()>;
}

/// Availability zone lookup.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// Lists the zone names of a region, in provider order.
    async fn availability_zones(&self, region: &str) -> CloudResult<Vec<String>>;
}
