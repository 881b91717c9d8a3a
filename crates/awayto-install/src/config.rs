//! Configuration for awayto-install.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{InstallError, InstallResult};
use crate::steps::StepPolicies;
use crate::types::InstallConfig;

const ENV_PREFIX: &str = "AWAYTO_";

/// Top-level configuration for an install run.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallerConfig {
    /// Values describing the environment to install.
    #[serde(default)]
    pub project: InstallConfig,

    /// Status polling behaviour.
    #[serde(default)]
    pub poll: PollConfig,

    /// Database instance parameters.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Function execution role.
    #[serde(default)]
    pub role: RoleConfig,

    /// Local file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Local shell commands.
    #[serde(default)]
    pub local: LocalConfig,

    /// Per-step failure policy overrides.
    #[serde(default)]
    pub steps: StepPolicies,

    /// Selectable regions, addressed by `project.region_index`.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            project: InstallConfig::default(),
            poll: PollConfig::default(),
            database: DatabaseConfig::default(),
            role: RoleConfig::default(),
            paths: PathsConfig::default(),
            local: LocalConfig::default(),
            steps: StepPolicies::default(),
            regions: default_regions(),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `awayto.toml` in the current directory (if present)
    /// 3. Environment variables with `AWAYTO_` prefix
    pub fn load() -> InstallResult<Self> {
        Self::from_file("awayto.toml")
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> InstallResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| InstallError::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check settings that cannot be expressed through serde alone.
    pub fn validate(&self) -> InstallResult<()> {
        if self.regions.is_empty() {
            return Err(InstallError::config("at least one region is required"));
        }
        if self.poll.interval_secs == 0 {
            return Err(InstallError::config("poll.interval_secs must be positive"));
        }
        self.steps.validate()
    }
}

/// Status polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Delay between status queries in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Spinner frame interval in milliseconds.
    #[serde(default = "default_spinner_interval_ms")]
    pub spinner_interval_ms: u64,

    /// Draw a spinner on stderr while waiting.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl PollConfig {
    /// Delay between status queries.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Spinner frame interval.
    #[must_use]
    pub const fn spinner_interval(&self) -> Duration {
        Duration::from_millis(self.spinner_interval_ms)
    }
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_spinner_interval_ms() -> u64 {
    250
}

const fn default_true() -> bool {
    true
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            spinner_interval_ms: default_spinner_interval_ms(),
            progress: true,
        }
    }
}

/// Database instance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database engine.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Instance class to match against orderable offerings.
    #[serde(default = "default_instance_class")]
    pub instance_class: String,

    /// Storage type to match against orderable offerings.
    #[serde(default = "default_storage_type")]
    pub storage_type: String,

    /// Initial storage in GB.
    #[serde(default = "default_allocated_storage_gb")]
    pub allocated_storage_gb: i32,

    /// Storage autoscaling ceiling in GB.
    #[serde(default = "default_max_allocated_storage_gb")]
    pub max_allocated_storage_gb: i32,

    /// Automated backup retention in days.
    #[serde(default)]
    pub backup_retention_days: i32,

    /// Port written to the parameter store.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Initial database name.
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

fn default_engine() -> String {
    "postgres".to_owned()
}

fn default_instance_class() -> String {
    "db.t2.micro".to_owned()
}

fn default_storage_type() -> String {
    "standard".to_owned()
}

const fn default_allocated_storage_gb() -> i32 {
    10
}

const fn default_max_allocated_storage_gb() -> i32 {
    20
}

const fn default_port() -> u16 {
    5432
}

fn default_database_name() -> String {
    "postgres".to_owned()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            instance_class: default_instance_class(),
            storage_type: default_storage_type(),
            allocated_storage_gb: default_allocated_storage_gb(),
            max_allocated_storage_gb: default_max_allocated_storage_gb(),
            backup_retention_days: 0,
            port: default_port(),
            database_name: default_database_name(),
        }
    }
}

/// Function execution role configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// Role name, shared by every environment in the account.
    #[serde(default = "default_role_name")]
    pub name: String,

    /// Managed policies attached when the role is created.
    #[serde(default = "default_policy_arns")]
    pub policy_arns: Vec<String>,
}

fn default_role_name() -> String {
    "LambdaTrust".to_owned()
}

fn default_policy_arns() -> Vec<String> {
    [
        "AmazonS3FullAccess",
        "CloudWatchFullAccess",
        "AmazonCognitoDeveloperAuthenticatedIdentities",
        "AmazonCognitoPowerUser",
        "service-role/AWSLambdaBasicExecutionRole",
        "AWSIoTFullAccess",
        "service-role/AWSConfigRulesExecutionRole",
        "service-role/AWSLambdaVPCAccessExecutionRole",
    ]
    .iter()
    .map(|policy| format!("arn:aws:iam::aws:policy/{policy}"))
    .collect()
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            name: default_role_name(),
            policy_arns: default_policy_arns(),
        }
    }
}

/// Local file locations, relative to the working directory.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Infrastructure template with `##id##` tokens.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Bootstrap function code uploaded before the stack is created.
    #[serde(default = "default_bootstrap_code")]
    pub bootstrap_code: PathBuf,

    /// API package directory.
    #[serde(default = "default_api_package")]
    pub api_package: PathBuf,

    /// Where the API archive is written before upload.
    #[serde(default = "default_archive")]
    pub archive: PathBuf,

    /// Directory receiving environment seed records.
    #[serde(default = "default_seeds_dir")]
    pub seeds_dir: PathBuf,

    /// Website build output.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

fn default_template() -> PathBuf {
    PathBuf::from("data/template.yaml.template")
}

fn default_bootstrap_code() -> PathBuf {
    PathBuf::from("data/lambda.zip")
}

fn default_api_package() -> PathBuf {
    PathBuf::from("apipkg")
}

fn default_archive() -> PathBuf {
    PathBuf::from("lambda.zip")
}

fn default_seeds_dir() -> PathBuf {
    PathBuf::from("data/seeds")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            bootstrap_code: default_bootstrap_code(),
            api_package: default_api_package(),
            archive: default_archive(),
            seeds_dir: default_seeds_dir(),
            build_dir: default_build_dir(),
        }
    }
}

/// Shell commands for the local steps. Each entry is a program followed by its arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    /// Dependency installation commands, run in order.
    #[serde(default = "default_install_commands")]
    pub install: Vec<Vec<String>>,

    /// Build commands, run in order.
    #[serde(default = "default_build_commands")]
    pub build: Vec<Vec<String>>,

    /// Program used to sync the build output to the website bucket.
    #[serde(default = "default_sync_program")]
    pub sync_program: String,
}

fn command(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_owned()).collect()
}

fn default_install_commands() -> Vec<Vec<String>> {
    vec![
        command(&["npm", "i"]),
        command(&["npm", "i", "--prefix", "./apipkg"]),
    ]
}

fn default_build_commands() -> Vec<Vec<String>> {
    vec![command(&["npm", "run", "build"])]
}

fn default_sync_program() -> String {
    "aws".to_owned()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            install: default_install_commands(),
            build: default_build_commands(),
            sync_program: default_sync_program(),
        }
    }
}

fn default_regions() -> Vec<String> {
    [
        "us-east-1",
        "us-east-2",
        "us-west-1",
        "us-west-2",
        "ca-central-1",
        "eu-west-1",
        "eu-west-2",
        "eu-west-3",
        "eu-central-1",
        "eu-north-1",
        "ap-south-1",
        "ap-northeast-1",
        "ap-northeast-2",
        "ap-southeast-1",
        "ap-southeast-2",
        "sa-east-1",
    ]
    .iter()
    .map(|r| (*r).to_owned())
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::steps::{FailurePolicy, StepName};

    #[test]
    fn default_config_is_valid() {
        let config = InstallerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.regions[0], "us-east-1");
        assert_eq!(config.poll.interval(), Duration::from_secs(10));
        assert_eq!(config.database.instance_class, "db.t2.micro");
        assert_eq!(config.role.name, "LambdaTrust");
        assert_eq!(config.role.policy_arns.len(), 8);
        assert!(config
            .role
            .policy_arns
            .iter()
            .all(|arn| arn.starts_with("arn:aws:iam::aws:policy/")));
        assert_eq!(config.project.name, "awayto");
    }

    #[test]
    fn config_from_toml() {
        let toml = r#"
            regions = ["eu-west-1", "us-east-1"]

            [project]
            name = "demo"
            environment = "prod"
            region_index = 1

            [poll]
            interval_secs = 30
            progress = false

            [database]
            instance_class = "db.t3.micro"

            [steps]
            deploy_api = "fatal"
        "#;

        let config: InstallerConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.project.name, "demo");
        assert_eq!(config.project.environment, "prod");
        assert_eq!(config.project.region_index, 1);
        assert_eq!(config.project.db_username, "postgres");
        assert_eq!(config.poll.interval_secs, 30);
        assert!(!config.poll.progress);
        assert_eq!(config.poll.spinner_interval_ms, 250);
        assert_eq!(config.database.instance_class, "db.t3.micro");
        assert_eq!(config.database.storage_type, "standard");
        assert_eq!(config.steps.policy_for(StepName::DeployApi), FailurePolicy::Fatal);
        assert_eq!(config.regions, vec!["eu-west-1", "us-east-1"]);
    }

    #[test]
    fn fatal_only_step_cannot_be_relaxed() {
        let config: InstallerConfig = toml::from_str(
            r#"
                [steps]
                deploy_stack = "continue"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_and_defaults_merge() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("awayto.toml");
        std::fs::write(&path, "[paths]\nseeds_dir = \"out/seeds\"\n").unwrap();

        let config = InstallerConfig::from_file(&path).unwrap();
        assert_eq!(config.paths.seeds_dir, PathBuf::from("out/seeds"));
        assert_eq!(config.paths.template, PathBuf::from("data/template.yaml.template"));
    }
}
