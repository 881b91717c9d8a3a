//! Named install steps and their failure policies.
//!
//! Every phase of a run is a [`StepName`] with an explicit
//! [`FailurePolicy`]. Provisioning and packaging steps produce data later
//! steps depend on and are always fatal; the local and deployment steps
//! default to continuing. Errors for which
//! [`InstallError::is_always_fatal`] holds abort the run under any policy.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{InstallError, InstallResult};

/// A phase of an install run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Start database instance creation.
    CreateDatabase,
    /// Write the parameter store entries.
    CreateParameters,
    /// Ensure the function execution role exists.
    EnsureRole,
    /// Create buckets and upload the template and bootstrap code.
    CreateBuckets,
    /// Create the stack and wait for it.
    DeployStack,
    /// Persist the environment seed.
    WriteSeed,
    /// Install local dependencies.
    InstallDependencies,
    /// Build the application.
    BuildApplication,
    /// Sync the website build output to its bucket.
    SyncWebsite,
    /// Archive the API package.
    PackageApi,
    /// Run the deployment pipeline.
    DeployApi,
}

impl StepName {
    /// All steps in execution order.
    pub const ALL: [Self; 11] = [
        Self::CreateDatabase,
        Self::CreateParameters,
        Self::EnsureRole,
        Self::CreateBuckets,
        Self::DeployStack,
        Self::WriteSeed,
        Self::InstallDependencies,
        Self::BuildApplication,
        Self::SyncWebsite,
        Self::PackageApi,
        Self::DeployApi,
    ];

    /// Stable name used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDatabase => "create_database",
            Self::CreateParameters => "create_parameters",
            Self::EnsureRole => "ensure_role",
            Self::CreateBuckets => "create_buckets",
            Self::DeployStack => "deploy_stack",
            Self::WriteSeed => "write_seed",
            Self::InstallDependencies => "install_dependencies",
            Self::BuildApplication => "build_application",
            Self::SyncWebsite => "sync_website",
            Self::PackageApi => "package_api",
            Self::DeployApi => "deploy_api",
        }
    }

    /// Whether the failure policy of this step may be overridden.
    #[must_use]
    pub const fn is_configurable(self) -> bool {
        matches!(
            self,
            Self::InstallDependencies
                | Self::BuildApplication
                | Self::SyncWebsite
                | Self::DeployApi
        )
    }

    /// Policy applied when nothing is configured.
    #[must_use]
    pub const fn default_policy(self) -> FailurePolicy {
        if self.is_configurable() {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Fatal
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the run when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run and surface the error.
    Fatal,
    /// Log the failure and carry on with the next independent step.
    Continue,
}

/// Per-step policy overrides, keyed by step name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct StepPolicies(BTreeMap<StepName, FailurePolicy>);

impl StepPolicies {
    /// Policy in effect for a step.
    #[must_use]
    pub fn policy_for(&self, step: StepName) -> FailurePolicy {
        self.0
            .get(&step)
            .copied()
            .unwrap_or_else(|| step.default_policy())
    }

    /// Override the policy of a step.
    #[must_use]
    pub fn with(mut self, step: StepName, policy: FailurePolicy) -> Self {
        self.0.insert(step, policy);
        self
    }

    /// Reject overrides that would let a provisioning step fail silently.
    pub fn validate(&self) -> InstallResult<()> {
        for (step, policy) in &self.0 {
            if *policy == FailurePolicy::Continue && !step.is_configurable() {
                return Err(InstallError::config(format!(
                    "step {step} is always fatal and cannot be set to continue"
                )));
            }
        }
        Ok(())
    }
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Completed without error.
    Succeeded,
    /// Failed under a `continue` policy.
    Failed(String),
}

/// Outcome of one step in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Step name.
    pub step: StepName,
    /// How it ended.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Ordered record of step outcomes for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepLog(Vec<StepReport>);

impl StepLog {
    /// Reports in execution order.
    #[must_use]
    pub fn reports(&self) -> &[StepReport] {
        &self.0
    }

    /// Outcome recorded for a step.
    #[must_use]
    pub fn outcome(&self, step: StepName) -> Option<&StepOutcome> {
        self.0.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    /// Whether every recorded step succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.0.iter().all(|r| r.outcome == StepOutcome::Succeeded)
    }

    /// Runs a step under its policy.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` when the step failed
    /// under [`FailurePolicy::Continue`], and the error when the step failed
    /// under [`FailurePolicy::Fatal`] or with an always-fatal error.
    pub async fn run_step<T, F>(
        &mut self,
        step: StepName,
        policy: FailurePolicy,
        future: F,
    ) -> InstallResult<Option<T>>
    where
        F: Future<Output = InstallResult<T>>,
    {
        info!(step = %step, "step started");

        match future.await {
            Ok(value) => {
                info!(step = %step, "step succeeded");
                self.0.push(StepReport {
                    step,
                    outcome: StepOutcome::Succeeded,
                });
                Ok(Some(value))
            }
            Err(err) if policy == FailurePolicy::Fatal || err.is_always_fatal() => {
                error!(step = %step, error = %err, "step failed, aborting run");
                Err(err)
            }
            Err(err) => {
                warn!(step = %step, error = %err, "step failed, continuing");
                self.0.push(StepReport {
                    step,
                    outcome: StepOutcome::Failed(err.to_string()),
                });
                Ok(None)
            }
        }
    }

    /// Runs a step whose failure always aborts the run.
    pub async fn run_fatal<T, F>(&mut self, step: StepName, future: F) -> InstallResult<T>
    where
        F: Future<Output = InstallResult<T>>,
    {
        self.run_step(step, FailurePolicy::Fatal, future)
            .await?
            .ok_or_else(|| InstallError::config(format!("step {step} produced no result")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn provisioning_steps_default_to_fatal() {
        let policies = StepPolicies::default();
        assert_eq!(policies.policy_for(StepName::CreateDatabase), FailurePolicy::Fatal);
        assert_eq!(policies.policy_for(StepName::DeployStack), FailurePolicy::Fatal);
        assert_eq!(policies.policy_for(StepName::WriteSeed), FailurePolicy::Fatal);
        assert_eq!(policies.policy_for(StepName::PackageApi), FailurePolicy::Fatal);
        assert_eq!(policies.policy_for(StepName::BuildApplication), FailurePolicy::Continue);
        assert_eq!(policies.policy_for(StepName::DeployApi), FailurePolicy::Continue);
    }

    #[test]
    fn overrides_apply_to_configurable_steps() {
        let policies = StepPolicies::default().with(StepName::DeployApi, FailurePolicy::Fatal);
        policies.validate().unwrap();
        assert_eq!(policies.policy_for(StepName::DeployApi), FailurePolicy::Fatal);
    }

    #[test]
    fn provisioning_steps_cannot_continue() {
        let policies =
            StepPolicies::default().with(StepName::EnsureRole, FailurePolicy::Continue);
        assert!(matches!(policies.validate(), Err(InstallError::Config(_))));
    }

    #[test]
    fn policies_parse_from_toml() {
        let policies: StepPolicies = toml::from_str(
            r#"
                sync_website = "fatal"
                build_application = "continue"
            "#,
        )
        .unwrap();
        assert_eq!(policies.policy_for(StepName::SyncWebsite), FailurePolicy::Fatal);
        assert_eq!(
            policies.policy_for(StepName::BuildApplication),
            FailurePolicy::Continue
        );
    }

    #[tokio::test]
    async fn continue_policy_records_failure() {
        let mut log = StepLog::default();
        let result: Option<()> = log
            .run_step(StepName::BuildApplication, FailurePolicy::Continue, async {
                Err(InstallError::config("boom"))
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(matches!(
            log.outcome(StepName::BuildApplication),
            Some(StepOutcome::Failed(msg)) if msg.contains("boom")
        ));
        assert!(!log.all_succeeded());
    }

    #[tokio::test]
    async fn fatal_policy_propagates() {
        let mut log = StepLog::default();
        let result: InstallResult<Option<()>> = log
            .run_step(StepName::CreateBuckets, FailurePolicy::Fatal, async {
                Err(InstallError::config("boom"))
            })
            .await;

        assert!(result.is_err());
        assert!(log.reports().is_empty());
    }

    #[tokio::test]
    async fn success_returns_value() {
        let mut log = StepLog::default();
        let value = log
            .run_step(StepName::SyncWebsite, FailurePolicy::Continue, async { Ok(7) })
            .await
            .unwrap();

        assert_eq!(value, Some(7));
        assert_eq!(log.outcome(StepName::SyncWebsite), Some(&StepOutcome::Succeeded));
    }

    #[tokio::test]
    async fn status_query_error_aborts_under_continue() {
        let mut log = StepLog::default();
        let result: InstallResult<Option<()>> = log
            .run_step(StepName::DeployApi, FailurePolicy::Continue, async {
                Err(InstallError::StatusQuery {
                    resource: "database".to_owned(),
                    source: Box::new(InstallError::config("AccessDenied")),
                })
            })
            .await;

        assert!(matches!(result, Err(InstallError::StatusQuery { .. })));
        assert!(log.reports().is_empty());
    }

    #[test]
    fn packaging_cannot_continue() {
        let policies =
            StepPolicies::default().with(StepName::PackageApi, FailurePolicy::Continue);
        assert!(matches!(policies.validate(), Err(InstallError::Config(_))));
    }
}
