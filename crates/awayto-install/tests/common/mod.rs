//! Common test utilities for installer integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use awayto_cloud::{
    CloudClients, DbInstanceOffering, DbInstanceState, MemoryCloud, StackResource, StackState,
};
use awayto_install::{
    InstallConfig, InstallError, InstallResult, Installer, InstallerConfig, LocalTasks,
    RunIdentity, StepName,
};
use tempfile::TempDir;

/// Fixed timestamp so every run has the same identity.
pub const SEED: i64 = 1_600_000_000_000;

/// Identity of the scripted run: `demodev1600000000000`.
pub fn identity() -> RunIdentity {
    RunIdentity::new("demo", "dev", SEED)
}

/// A cloud where every provisioning call succeeds and the stack completes.
pub fn ready_cloud() -> MemoryCloud {
    let id = identity();
    base_cloud().with_stack_statuses([
        StackState::new(id.as_str(), "CREATE_IN_PROGRESS"),
        StackState::new(id.as_str(), "CREATE_COMPLETE"),
    ])
}

/// A cloud with every provider scripted except stack statuses.
pub fn base_cloud() -> MemoryCloud {
    let id = identity();

    MemoryCloud::new()
        .with_zones("us-east-1", &["us-east-1a", "us-east-1b"])
        .with_offering(DbInstanceOffering {
            engine: "postgres".to_owned(),
            engine_version: "14.7".to_owned(),
            instance_class: "db.t2.micro".to_owned(),
            storage_type: "standard".to_owned(),
        })
        .with_stack_resources([
            StackResource::new(id.function_key(), "fn-123"),
            StackResource::new("CognitoUserPool", "pool-1"),
            StackResource::new("CognitoUserPoolClient", "client-1"),
            StackResource::new(id.api_key(), "api-1"),
            StackResource::new(id.stage_key(), "dev"),
        ])
        .with_db_statuses([
            DbInstanceState::new(id.as_str(), "creating"),
            DbInstanceState::new(id.as_str(), "backing-up"),
            DbInstanceState::new(id.as_str(), "available").with_endpoint("db.example.com"),
        ])
        .with_function("fn-123", [("FOO".to_owned(), "bar".to_owned())])
}

/// Local tasks that record their calls and fail on request.
#[derive(Debug, Default)]
pub struct RecordingTasks {
    calls: Mutex<Vec<String>>,
    failing: HashSet<StepName>,
}

impl RecordingTasks {
    /// Make a local step fail.
    pub fn failing(mut self, step: StepName) -> Self {
        self.failing.insert(step);
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, step: StepName, call: String) -> InstallResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(&step) {
            return Err(InstallError::Command {
                step,
                message: "exited with exit status: 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LocalTasks for RecordingTasks {
    async fn install_dependencies(&self) -> InstallResult<()> {
        self.record(StepName::InstallDependencies, "install".to_owned())
    }

    async fn build(&self) -> InstallResult<()> {
        self.record(StepName::BuildApplication, "build".to_owned())
    }

    async fn sync_website(&self, bucket: &str, _build_dir: &Path) -> InstallResult<()> {
        self.record(StepName::SyncWebsite, format!("sync:{bucket}"))
    }
}

/// Installer wired to an in-memory cloud and a scratch project directory.
pub struct TestInstall {
    pub dir: TempDir,
    pub cloud: Arc<MemoryCloud>,
    pub local: Arc<RecordingTasks>,
    pub config: InstallerConfig,
}

impl TestInstall {
    /// Creates a project directory with a template, bootstrap code and API package.
    pub fn new(cloud: MemoryCloud) -> Self {
        Self::with_tasks(cloud, RecordingTasks::default())
    }

    /// Same as [`TestInstall::new`] with custom local tasks.
    pub fn with_tasks(cloud: MemoryCloud, local: RecordingTasks) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(
            root.join("data/template.yaml.template"),
            "Resources:\n  ##id##Resource:\n    Type: AWS::Serverless::Function\n",
        )
        .unwrap();
        std::fs::write(root.join("data/lambda.zip"), b"PK\x05\x06bootstrap").unwrap();

        std::fs::create_dir_all(root.join("apipkg/routes")).unwrap();
        std::fs::write(root.join("apipkg/index.js"), "exports.handler = () => {};").unwrap();
        std::fs::write(root.join("apipkg/routes/deploy.js"), "module.exports = {};").unwrap();

        let mut config = InstallerConfig::default();
        config.project = InstallConfig {
            name: "demo".to_owned(),
            environment: "dev".to_owned(),
            db_username: "postgres".to_owned(),
            db_password: "postgres1".to_owned(),
            region_index: 0,
            ..InstallConfig::default()
        };
        config.poll.progress = false;
        config.paths.template = root.join("data/template.yaml.template");
        config.paths.bootstrap_code = root.join("data/lambda.zip");
        config.paths.api_package = root.join("apipkg");
        config.paths.archive = root.join("lambda.zip");
        config.paths.seeds_dir = root.join("data/seeds");
        config.paths.build_dir = root.join("build");

        Self {
            dir,
            cloud: Arc::new(cloud),
            local: Arc::new(local),
            config,
        }
    }

    /// Builds an installer over the shared in-memory cloud.
    pub fn installer(&self) -> Installer {
        Installer::new(
            CloudClients::uniform(Arc::clone(&self.cloud)),
            self.config.clone(),
            Arc::clone(&self.local) as Arc<dyn LocalTasks>,
        )
    }
}
