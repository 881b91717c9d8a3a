//! In-memory cloud backend for testing and development.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{CloudError, CloudResult};
use crate::traits::{
    DatabaseApi, FunctionApi, IdentityApi, ObjectStorage, ParameterStore, StackApi, ZoneApi,
};
use crate::types::{
    CreateDbInstance, CreateStack, DbInstanceOffering, DbInstanceState, FunctionConfiguration,
    Parameter, StackResource, StackState,
};

/// A call recorded by [`MemoryCloud`], in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    /// `DatabaseApi::orderable_offerings`.
    OrderableOfferings { engine: String },
    /// `DatabaseApi::create_instance`.
    CreateInstance { identifier: String, engine_version: String },
    /// `DatabaseApi::modify_master_password`.
    ModifyMasterPassword { identifier: String },
    /// `DatabaseApi::describe_instance`.
    DescribeInstance { identifier: String },
    /// `StackApi::create_stack`.
    CreateStack { name: String, template_url: String },
    /// `StackApi::describe_stack`.
    DescribeStack { name: String },
    /// `StackApi::list_resources`.
    ListResources { name: String },
    /// `ParameterStore::put_parameter`.
    PutParameter { name: String, value: String, overwrite: bool },
    /// `IdentityApi::get_role`.
    GetRole { name: String },
    /// `IdentityApi::create_role`.
    CreateRole { name: String },
    /// `IdentityApi::attach_role_policy`.
    AttachRolePolicy { name: String, policy_arn: String },
    /// `ObjectStorage::create_bucket`.
    CreateBucket { bucket: String },
    /// `ObjectStorage::put_object`.
    PutObject { bucket: String, key: String },
    /// `ObjectStorage::put_bucket_website`.
    PutBucketWebsite { bucket: String },
    /// `ObjectStorage::allow_public_policy`.
    AllowPublicPolicy { bucket: String },
    /// `ObjectStorage::put_bucket_policy`.
    PutBucketPolicy { bucket: String },
    /// `FunctionApi::get_configuration`.
    GetFunctionConfiguration { name: String },
    /// `FunctionApi::update_environment`.
    UpdateFunctionEnvironment { name: String },
    /// `FunctionApi::update_code`.
    UpdateFunctionCode { name: String, bucket: String, key: String },
    /// `FunctionApi::invoke_event`.
    InvokeEvent { name: String },
    /// `ZoneApi::availability_zones`.
    AvailabilityZones { region: String },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<CloudCall>,
    failures: HashMap<&'static str, String>,
    offerings: Vec<DbInstanceOffering>,
    db_statuses: VecDeque<DbInstanceState>,
    stack_statuses: VecDeque<StackState>,
    stack_resources: Vec<StackResource>,
    roles: HashSet<String>,
    role_policies: HashMap<String, Vec<String>>,
    role_lookup_error: Option<String>,
    parameters: BTreeMap<String, String>,
    buckets: HashSet<String>,
    objects: HashMap<(String, String), Vec<u8>>,
    bucket_policies: HashMap<String, String>,
    functions: HashMap<String, BTreeMap<String, String>>,
    invocations: Vec<(String, Vec<u8>)>,
    zones: HashMap<String, Vec<String>>,
}

impl State {
    fn check(&self, operation: &'static str) -> CloudResult<()> {
        match self.failures.get(operation) {
            Some(message) => Err(CloudError::service(operation, message.clone())),
            None => Ok(()),
        }
    }
}

/// Pops the next scripted state, repeating the last one once the script runs dry.
fn next_scripted<T: Clone>(script: &mut VecDeque<T>) -> Option<T> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

/// In-memory implementation of every provider trait.
///
/// Records each call as a [`CloudCall`] and serves scripted status
/// sequences for database instances and stacks. Operations can be forced to
/// fail by name (for example `"s3:CreateBucket"`).
///
/// Intended for tests; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryCloud {
    state: Mutex<State>,
}

impl MemoryCloud {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an orderable database offering.
    #[must_use]
    pub fn with_offering(self, offering: DbInstanceOffering) -> Self {
        self.state().offerings.push(offering);
        self
    }

    /// Scripts the database statuses returned by successive describes.
    #[must_use]
    pub fn with_db_statuses(self, statuses: impl IntoIterator<Item = DbInstanceState>) -> Self {
        self.state().db_statuses.extend(statuses);
        self
    }

    /// Scripts the stack statuses returned by successive describes.
    #[must_use]
    pub fn with_stack_statuses(self, statuses: impl IntoIterator<Item = StackState>) -> Self {
        self.state().stack_statuses.extend(statuses);
        self
    }

    /// Sets the resources listed for any stack.
    #[must_use]
    pub fn with_stack_resources(self, resources: impl IntoIterator<Item = StackResource>) -> Self {
        self.state().stack_resources.extend(resources);
        self
    }

    /// Registers an existing role.
    #[must_use]
    pub fn with_role(self, name: impl Into<String>) -> Self {
        self.state().roles.insert(name.into());
        self
    }

    /// Makes role lookups fail with a service error instead of not-found.
    #[must_use]
    pub fn with_role_lookup_error(self, message: impl Into<String>) -> Self {
        self.state().role_lookup_error = Some(message.into());
        self
    }

    /// Registers a function with its current environment.
    #[must_use]
    pub fn with_function(
        self,
        name: impl Into<String>,
        environment: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.state()
            .functions
            .insert(name.into(), environment.into_iter().collect());
        self
    }

    /// Sets the availability zones of a region.
    #[must_use]
    pub fn with_zones(self, region: impl Into<String>, zones: &[&str]) -> Self {
        self.state().zones.insert(
            region.into(),
            zones.iter().map(|z| (*z).to_owned()).collect(),
        );
        self
    }

    /// Forces an operation to fail with a service error.
    #[must_use]
    pub fn failing(self, operation: &'static str, message: impl Into<String>) -> Self {
        self.state().failures.insert(operation, message.into());
        self
    }

    /// All calls issued so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CloudCall> {
        self.state().calls.clone()
    }

    /// Number of recorded calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&CloudCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Current value of a parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<String> {
        self.state().parameters.get(name).cloned()
    }

    /// Stored object body.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state()
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
    }

    /// Current bucket policy document.
    #[must_use]
    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.state().bucket_policies.get(bucket).cloned()
    }

    /// Policies attached to a role.
    #[must_use]
    pub fn role_policies(&self, name: &str) -> Vec<String> {
        self.state()
            .role_policies
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Current environment of a function.
    #[must_use]
    pub fn function_environment(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.state().functions.get(name).cloned()
    }

    /// Payloads of event invocations, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<(String, Vec<u8>)> {
        self.state().invocations.clone()
    }
}

#[async_trait]
impl DatabaseApi for MemoryCloud {
    async fn orderable_offerings(&self, engine: &str) -> CloudResult<Vec<DbInstanceOffering>> {
        let mut state = self.state();
        state.calls.push(CloudCall::OrderableOfferings {
            engine: engine.to_owned(),
        });
        state.check("rds:DescribeOrderableDBInstanceOptions")?;

        Ok(state
            .offerings
            .iter()
            .filter(|o| o.engine == engine)
            .cloned()
            .collect())
    }

    async fn create_instance(&self, request: &CreateDbInstance) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::CreateInstance {
            identifier: request.identifier.clone(),
            engine_version: request.engine_version.clone(),
        });
        state.check("rds:CreateDBInstance")
    }

    async fn modify_master_password(&self, identifier: &str, _password: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::ModifyMasterPassword {
            identifier: identifier.to_owned(),
        });
        state.check("rds:ModifyDBInstance")
    }

    async fn describe_instance(&self, identifier: &str) -> CloudResult<DbInstanceState> {
        let mut state = self.state();
        state.calls.push(CloudCall::DescribeInstance {
            identifier: identifier.to_owned(),
        });
        state.check("rds:DescribeDBInstances")?;

        next_scripted(&mut state.db_statuses)
            .map(|s| DbInstanceState {
                identifier: identifier.to_owned(),
                ..s
            })
            .ok_or_else(|| CloudError::service("rds:DescribeDBInstances", "DBInstanceNotFound"))
    }
}

#[async_trait]
impl StackApi for MemoryCloud {
    async fn create_stack(&self, request: &CreateStack) -> CloudResult<String> {
        let mut state = self.state();
        state.calls.push(CloudCall::CreateStack {
            name: request.name.clone(),
            template_url: request.template_url.clone(),
        });
        state.check("cloudformation:CreateStack")?;
        Ok(format!("arn:aws:cloudformation:::stack/{}", request.name))
    }

    async fn describe_stack(&self, name: &str) -> CloudResult<StackState> {
        let mut state = self.state();
        state.calls.push(CloudCall::DescribeStack {
            name: name.to_owned(),
        });
        state.check("cloudformation:DescribeStacks")?;

        next_scripted(&mut state.stack_statuses)
            .map(|s| StackState {
                name: name.to_owned(),
                ..s
            })
            .ok_or_else(|| {
                CloudError::service("cloudformation:DescribeStacks", "stack does not exist")
            })
    }

    async fn list_resources(&self, name: &str) -> CloudResult<Vec<StackResource>> {
        let mut state = self.state();
        state.calls.push(CloudCall::ListResources {
            name: name.to_owned(),
        });
        state.check("cloudformation:ListStackResources")?;
        Ok(state.stack_resources.clone())
    }
}

#[async_trait]
impl ParameterStore for MemoryCloud {
    async fn put_parameter(&self, parameter: &Parameter) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::PutParameter {
            name: parameter.name.clone(),
            value: parameter.value.clone(),
            overwrite: parameter.overwrite,
        });
        state.check("ssm:PutParameter")?;

        if !parameter.overwrite && state.parameters.contains_key(&parameter.name) {
            return Err(CloudError::service(
                "ssm:PutParameter",
                format!("ParameterAlreadyExists: {}", parameter.name),
            ));
        }

        state
            .parameters
            .insert(parameter.name.clone(), parameter.value.clone());
        Ok(())
    }
}

#[async_trait]
impl IdentityApi for MemoryCloud {
    async fn get_role(&self, name: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::GetRole {
            name: name.to_owned(),
        });
        state.check("iam:GetRole")?;

        if let Some(message) = &state.role_lookup_error {
            return Err(CloudError::service("iam:GetRole", message.clone()));
        }

        if state.roles.contains(name) {
            Ok(())
        } else {
            Err(CloudError::not_found("role", name))
        }
    }

    async fn create_role(&self, name: &str, _trust_policy: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::CreateRole {
            name: name.to_owned(),
        });
        state.check("iam:CreateRole")?;
        state.roles.insert(name.to_owned());
        Ok(())
    }

    async fn attach_role_policy(&self, name: &str, policy_arn: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::AttachRolePolicy {
            name: name.to_owned(),
            policy_arn: policy_arn.to_owned(),
        });
        state.check("iam:AttachRolePolicy")?;

        if !state.roles.contains(name) {
            return Err(CloudError::not_found("role", name));
        }

        state
            .role_policies
            .entry(name.to_owned())
            .or_default()
            .push(policy_arn.to_owned());
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryCloud {
    async fn create_bucket(&self, bucket: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::CreateBucket {
            bucket: bucket.to_owned(),
        });
        state.check("s3:CreateBucket")?;

        if !state.buckets.insert(bucket.to_owned()) {
            return Err(CloudError::service(
                "s3:CreateBucket",
                format!("BucketAlreadyOwnedByYou: {bucket}"),
            ));
        }
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::PutObject {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        });
        state.check("s3:PutObject")?;

        if !state.buckets.contains(bucket) {
            return Err(CloudError::service(
                "s3:PutObject",
                format!("NoSuchBucket: {bucket}"),
            ));
        }

        state
            .objects
            .insert((bucket.to_owned(), key.to_owned()), body);
        Ok(())
    }

    async fn put_bucket_website(&self, bucket: &str, _index_document: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::PutBucketWebsite {
            bucket: bucket.to_owned(),
        });
        state.check("s3:PutBucketWebsite")
    }

    async fn allow_public_policy(&self, bucket: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::AllowPublicPolicy {
            bucket: bucket.to_owned(),
        });
        state.check("s3:DeletePublicAccessBlock")
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::PutBucketPolicy {
            bucket: bucket.to_owned(),
        });
        state.check("s3:PutBucketPolicy")?;
        state
            .bucket_policies
            .insert(bucket.to_owned(), policy.to_owned());
        Ok(())
    }
}

#[async_trait]
impl FunctionApi for MemoryCloud {
    async fn get_configuration(&self, name: &str) -> CloudResult<FunctionConfiguration> {
        let mut state = self.state();
        state.calls.push(CloudCall::GetFunctionConfiguration {
            name: name.to_owned(),
        });
        state.check("lambda:GetFunctionConfiguration")?;

        let environment = state.functions.get(name).cloned().ok_or_else(|| {
            CloudError::service(
                "lambda:GetFunctionConfiguration",
                format!("ResourceNotFoundException: {name}"),
            )
        })?;

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
        let mut state = self.state();
        state.calls.push(CloudCall::UpdateFunctionEnvironment {
            name: name.to_owned(),
        });
        state.check("lambda:UpdateFunctionConfiguration")?;
        state.functions.insert(name.to_owned(), variables.clone());
        Ok(())
    }

    async fn update_code(&self, name: &str, bucket: &str, key: &str) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::UpdateFunctionCode {
            name: name.to_owned(),
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        });
        state.check("lambda:UpdateFunctionCode")
    }

    async fn invoke_event(&self, name: &str, payload: Vec<u8>) -> CloudResult<()> {
        let mut state = self.state();
        state.calls.push(CloudCall::InvokeEvent {
            name: name.to_owned(),
        });
        state.check("lambda:Invoke")?;
        state.invocations.push((name.to_owned(), payload));
        Ok(())
    }
}

#[async_trait]
impl ZoneApi for MemoryCloud {
    async fn availability_zones(&self, region: &str) -> CloudResult<Vec<String>> {
        let mut state = self.state();
        state.calls.push(CloudCall::AvailabilityZones {
            region: region.to_owned(),
        });
        state.check("ec2:DescribeAvailabilityZones")?;
        Ok(state.zones.get(region).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_statuses_repeat_last_entry() {
        let cloud = MemoryCloud::new().with_db_statuses([
            DbInstanceState::new("db", "creating"),
            DbInstanceState::new("db", "available").with_endpoint("db.example.com"),
        ]);

        assert_eq!(cloud.describe_instance("db").await.unwrap().status, "creating");
        assert_eq!(cloud.describe_instance("db").await.unwrap().status, "available");

        let last = cloud.describe_instance("db").await.unwrap();
        assert_eq!(last.status, "available");
        assert_eq!(last.endpoint.as_deref(), Some("db.example.com"));
    }

    #[tokio::test]
    async fn missing_role_is_not_found_but_lookup_error_is_not() {
        let cloud = MemoryCloud::new();
        assert!(cloud.get_role("LambdaTrust").await.unwrap_err().is_not_found());

        let denied = MemoryCloud::new().with_role_lookup_error("AccessDenied");
        assert!(!denied.get_role("LambdaTrust").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn parameters_require_overwrite_to_replace() {
        let cloud = MemoryCloud::new();
        cloud.put_parameter(&Parameter::new("PGHOST_x", "tempvalue")).await.unwrap();

        assert!(cloud
            .put_parameter(&Parameter::new("PGHOST_x", "db.example.com"))
            .await
            .is_err());

        cloud
            .put_parameter(&Parameter::new("PGHOST_x", "db.example.com").overwriting())
            .await
            .unwrap();
        assert_eq!(cloud.parameter("PGHOST_x").as_deref(), Some("db.example.com"));
    }

    #[tokio::test]
    async fn forced_failures_are_service_errors() {
        let cloud = MemoryCloud::new().failing("s3:CreateBucket", "AccessDenied");
        let err = cloud.create_bucket("b").await.unwrap_err();
        assert!(matches!(err, CloudError::Service { operation: "s3:CreateBucket", .. }));
        assert_eq!(cloud.calls(), vec![CloudCall::CreateBucket { bucket: "b".to_owned() }]);
    }
}
