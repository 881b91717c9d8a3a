//! Implementation of the `awayto install` command.

use std::path::PathBuf;

use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use awayto_cloud::CloudClients;
use awayto_install::{resolve_region, InstallerConfig, Installer, StepOutcome};
use clap::Args;

/// Values that override the configured project settings.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Project name (lowercase letters and digits)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Project description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Environment name (lowercase letters and digits)
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Database master username
    #[arg(long)]
    pub db_username: Option<String>,

    /// Database master password
    #[arg(long, env = "AWAYTO_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Index into the region list (see `awayto regions`)
    #[arg(long)]
    pub region_index: Option<usize>,

    /// Index into the availability zones of the region
    #[arg(long)]
    pub zone_index: Option<usize>,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

impl InstallArgs {
    fn apply(self, config: &mut InstallerConfig) {
        let project = &mut config.project;
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(environment) = self.environment {
            project.environment = environment;
        }
        if let Some(username) = self.db_username {
            project.db_username = username;
        }
        if let Some(password) = self.db_password {
            project.db_password = password;
        }
        if let Some(index) = self.region_index {
            project.region_index = index;
        }
        if let Some(index) = self.zone_index {
            project.zone_index = index;
        }
        if self.no_progress {
            config.poll.progress = false;
        }
    }
}

pub async fn run(config_path: Option<PathBuf>, args: InstallArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path.as_deref())?;
    args.apply(&mut config);
    config.project.validate()?;

    let region = resolve_region(&config.regions, config.project.region_index)?.to_owned();
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .load()
        .await;
    let clients = CloudClients::from_sdk_config(&sdk_config);

    println!(
        "Installing {} ({}) into {}",
        config.project.name, config.project.environment, region
    );
    println!();

    let installer = Installer::with_shell_tasks(clients, config);
    let report = installer.run().await.context("install failed")?;

    println!();
    println!("Environment {} created.", report.identity);
    println!("  Seed: {}", report.seed_path.display());
    if let Some(deployed) = &report.deployed {
        println!("  Function: {}", deployed.function_name);
        println!("  Database: {}", deployed.database_host);
    }

    let failed: Vec<_> = report
        .steps
        .reports()
        .iter()
        .filter(|r| r.outcome != StepOutcome::Succeeded)
        .collect();
    if !failed.is_empty() {
        println!();
        println!("Some steps did not complete:");
        for report in failed {
            if let StepOutcome::Failed(message) = &report.outcome {
                println!("  {}: {}", report.step, message);
            }
        }
    }

    println!();
    println!("Site available at {}", report.website());
    Ok(())
}
