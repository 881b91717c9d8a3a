//! Local build and sync steps run as shell commands.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::LocalConfig;
use crate::error::{InstallError, InstallResult};
use crate::steps::StepName;

/// Local steps of an install, reported only as succeeded or failed.
#[async_trait]
pub trait LocalTasks: Send + Sync {
    /// Install application and API dependencies.
    async fn install_dependencies(&self) -> InstallResult<()>;

    /// Build the application.
    async fn build(&self) -> InstallResult<()>;

    /// Copy the website build output into its bucket.
    async fn sync_website(&self, bucket: &str, build_dir: &Path) -> InstallResult<()>;
}

/// Runs the configured commands with inherited stdio.
#[derive(Debug, Clone)]
pub struct ShellTasks {
    config: LocalConfig,
}

impl ShellTasks {
    /// Create shell tasks from configuration.
    #[must_use]
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    async fn run_all(&self, step: StepName, commands: &[Vec<String>]) -> InstallResult<()> {
        for command in commands {
            let (program, args) = command.split_first().ok_or_else(|| InstallError::Command {
                step,
                message: "empty command".to_owned(),
            })?;
            run(step, program, args).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LocalTasks for ShellTasks {
    async fn install_dependencies(&self) -> InstallResult<()> {
        self.run_all(StepName::InstallDependencies, &self.config.install)
            .await
    }

    async fn build(&self) -> InstallResult<()> {
        self.run_all(StepName::BuildApplication, &self.config.build)
            .await
    }

    async fn sync_website(&self, bucket: &str, build_dir: &Path) -> InstallResult<()> {
        let args = [
            "s3".to_owned(),
            "sync".to_owned(),
            build_dir.display().to_string(),
            format!("s3://{bucket}"),
        ];
        run(StepName::SyncWebsite, &self.config.sync_program, &args).await
    }
}

async fn run(step: StepName, program: &str, args: &[String]) -> InstallResult<()> {
    debug!(step = %step, program = %program, args = ?args, "running command");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| InstallError::Command {
            step,
            message: format!("failed to start {program}: {e}"),
        })?;

    if !status.success() {
        return Err(InstallError::Command {
            step,
            message: format!("{program} exited with {status}"),
        });
    }

    Ok(())
}
