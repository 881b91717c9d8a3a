//! Integration tests for execution role handling across runs.

mod common;

use std::sync::Arc;

use awayto_cloud::{CloudCall, CloudClients, MemoryCloud};
use awayto_install::config::{DatabaseConfig, RoleConfig};
use awayto_install::{InstallError, ResourceProvisioner, RoleOutcome};
use common::{ready_cloud, TestInstall};

fn provisioner(cloud: &Arc<MemoryCloud>) -> ResourceProvisioner {
    ResourceProvisioner::new(
        &CloudClients::uniform(Arc::clone(cloud)),
        DatabaseConfig::default(),
    )
}

fn role_calls(cloud: &MemoryCloud) -> (usize, usize) {
    (
        cloud.count(|c| matches!(c, CloudCall::CreateRole { .. })),
        cloud.count(|c| matches!(c, CloudCall::AttachRolePolicy { .. })),
    )
}

#[tokio::test]
async fn missing_role_is_created_with_every_policy() {
    let cloud = Arc::new(MemoryCloud::new());
    let role = RoleConfig::default();

    let outcome = provisioner(&cloud).ensure_execution_role(&role).await.unwrap();

    assert_eq!(outcome, RoleOutcome::Created);
    assert_eq!(role_calls(&cloud), (1, 8));
    assert_eq!(cloud.role_policies("LambdaTrust"), role.policy_arns);
}

#[tokio::test]
async fn existing_role_is_left_untouched() {
    let cloud = Arc::new(MemoryCloud::new().with_role("LambdaTrust"));

    let outcome = provisioner(&cloud)
        .ensure_execution_role(&RoleConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome, RoleOutcome::Existing);
    assert_eq!(role_calls(&cloud), (0, 0));
}

#[tokio::test]
async fn second_ensure_reuses_the_created_role() {
    let cloud = Arc::new(MemoryCloud::new());
    let provisioner = provisioner(&cloud);
    let role = RoleConfig::default();

    provisioner.ensure_execution_role(&role).await.unwrap();
    let second = provisioner.ensure_execution_role(&role).await.unwrap();

    assert_eq!(second, RoleOutcome::Existing);
    assert_eq!(role_calls(&cloud), (1, 8));
}

#[tokio::test]
async fn lookup_failure_is_not_treated_as_missing() {
    let cloud = Arc::new(MemoryCloud::new().with_role_lookup_error("AccessDenied"));

    let err = provisioner(&cloud)
        .ensure_execution_role(&RoleConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::Cloud(_)));
    assert_eq!(role_calls(&cloud), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn installs_into_an_account_with_the_role_skip_creation() {
    let test = TestInstall::new(ready_cloud().with_role("LambdaTrust"));

    let report = test.installer().run_as(common::identity()).await.unwrap();

    assert!(report.steps.all_succeeded());
    assert_eq!(role_calls(&test.cloud), (0, 0));
}
