//! End-to-end install orchestration.

use std::path::PathBuf;
use std::sync::Arc;

use awayto_cloud::CloudClients;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::InstallerConfig;
use crate::error::InstallResult;
use crate::local::{LocalTasks, ShellTasks};
use crate::packager;
use crate::pipeline::{Deployed, DeploymentPipeline};
use crate::poller::Poller;
use crate::resources::{ResourceProvisioner, RoleOutcome};
use crate::seed::EnvironmentSeed;
use crate::stack::StackDeployer;
use crate::steps::{StepLog, StepName};
use crate::types::{resolve_region, RunIdentity};

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Identity every resource was named after.
    pub identity: RunIdentity,
    /// Region the environment was created in.
    pub region: String,
    /// Resolved environment record.
    pub seed: EnvironmentSeed,
    /// Where the seed record was written.
    pub seed_path: PathBuf,
    /// Outcome of each step, in execution order.
    pub steps: StepLog,
    /// Database wiring, when the API deployment succeeded.
    #[serde(skip)]
    pub deployed: Option<Deployed>,
}

impl InstallReport {
    /// Public website URL.
    #[must_use]
    pub fn website(&self) -> &str {
        &self.seed.website
    }
}

/// Runs a full install against injected provider clients.
pub struct Installer {
    clients: CloudClients,
    config: InstallerConfig,
    local: Arc<dyn LocalTasks>,
}

impl Installer {
    /// Create an installer with explicit local tasks.
    #[must_use]
    pub fn new(clients: CloudClients, config: InstallerConfig, local: Arc<dyn LocalTasks>) -> Self {
        Self {
            clients,
            config,
            local,
        }
    }

    /// Create an installer that runs the configured shell commands for local steps.
    #[must_use]
    pub fn with_shell_tasks(clients: CloudClients, config: InstallerConfig) -> Self {
        let local = Arc::new(ShellTasks::new(config.local.clone()));
        Self::new(clients, config, local)
    }

    /// Run an install with a freshly generated identity.
    pub async fn run(&self) -> InstallResult<InstallReport> {
        self.run_as(self.config.project.identity()).await
    }

    /// Run an install under a given identity.
    ///
    /// Provisioning steps abort the run on failure. Local and deployment
    /// steps follow their configured [`FailurePolicy`](crate::FailurePolicy).
    pub async fn run_as(&self, identity: RunIdentity) -> InstallResult<InstallReport> {
        let config = &self.config;
        let install = &config.project;

        config.validate()?;
        install.validate()?;

        let region = resolve_region(&config.regions, install.region_index)?.to_owned();
        let poller = Poller::from_config(&config.poll);
        let provisioner = ResourceProvisioner::new(&self.clients, config.database.clone());
        let deployer = StackDeployer::new(Arc::clone(&self.clients.stacks), poller.clone());
        let pipeline = DeploymentPipeline::new(&self.clients, poller);

        info!(id = %identity, region = %region, "beginning install");
        let mut log = StepLog::default();

        log.run_fatal(StepName::CreateDatabase, async {
            let zone = provisioner.select_zone(&region, install.zone_index).await?;
            provisioner
                .create_database(&identity, install, Some(zone))
                .await
        })
        .await?;

        log.run_fatal(
            StepName::CreateParameters,
            provisioner.create_parameter_entries(
                &identity,
                &install.db_username,
                &install.db_password,
            ),
        )
        .await?;

        let role = log
            .run_fatal(
                StepName::EnsureRole,
                provisioner.ensure_execution_role(&config.role),
            )
            .await?;
        if role == RoleOutcome::Created {
            info!(role = %config.role.name, "execution role created");
        }

        log.run_fatal(
            StepName::CreateBuckets,
            provisioner.create_storage_buckets(
                &identity,
                &config.paths.template,
                &config.paths.bootstrap_code,
            ),
        )
        .await?;

        let resources = log
            .run_fatal(StepName::DeployStack, async {
                deployer
                    .deploy_stack(&identity, &identity.template_url(), &install.environment)
                    .await?;
                deployer.await_completion(&identity).await?;
                deployer.extract_resource_map(&identity).await
            })
            .await?;

        let (seed, seed_path) = log
            .run_fatal(StepName::WriteSeed, async {
                let seed = EnvironmentSeed::build(&identity, install, &region, &resources)?;
                let path = seed.write_to(&config.paths.seeds_dir).await?;
                Ok((seed, path))
            })
            .await?;

        log.run_step(
            StepName::InstallDependencies,
            config.steps.policy_for(StepName::InstallDependencies),
            self.local.install_dependencies(),
        )
        .await?;

        log.run_step(
            StepName::BuildApplication,
            config.steps.policy_for(StepName::BuildApplication),
            self.local.build(),
        )
        .await?;

        log.run_step(
            StepName::SyncWebsite,
            config.steps.policy_for(StepName::SyncWebsite),
            self.local
                .sync_website(&identity.webapp_bucket(), &config.paths.build_dir),
        )
        .await?;

        let archive = log
            .run_fatal(
                StepName::PackageApi,
                packager::package_directory(&config.paths.api_package, &config.paths.archive),
            )
            .await?;

        let deployed = log
            .run_step(
                StepName::DeployApi,
                config.steps.policy_for(StepName::DeployApi),
                pipeline.deploy(&identity, &seed.function_name, &archive, &install.db_password),
            )
            .await?;

        if log.all_succeeded() {
            info!(id = %identity, website = %seed.website, "install complete");
        } else {
            warn!(id = %identity, "install finished with failed steps; re-run to retry them");
        }

        Ok(InstallReport {
            identity,
            region,
            seed,
            seed_path,
            steps: log,
            deployed,
        })
    }
}
