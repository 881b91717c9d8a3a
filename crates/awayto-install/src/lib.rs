//! Awayto installer
//!
//! Provisions a complete cloud environment for a named project instance,
//! wires the resulting endpoints back into application configuration and
//! deploys the API package.
//!
//! # Architecture
//!
//! A run is a fixed sequence of named steps driven by [`Installer`]:
//!
//! ```text
//! CreateDatabase ─▶ CreateParameters ─▶ EnsureRole ─▶ CreateBuckets ─▶ DeployStack ─▶ WriteSeed
//!                                                                                       │
//!   DeployApi ◀── PackageApi ◀── SyncWebsite ◀── BuildApplication ◀── InstallDependencies
//! ```
//!
//! - **Resource provisioning** ([`ResourceProvisioner`]): database, parameter
//!   store entries, the shared execution role and the two buckets. Always fatal
//!   on failure.
//! - **Stack deployment** ([`StackDeployer`]): submits the infrastructure
//!   template, waits for a terminal status and lists the created resources.
//! - **Local steps** ([`LocalTasks`]): dependency install, build and website
//!   sync, run as shell commands.
//! - **API deployment** ([`packager`], [`DeploymentPipeline`]): archives the
//!   API package, updates the function and wires in the database endpoint.
//!
//! Every wait on an eventually-consistent resource goes through [`Poller`].
//! Provider access is injected as an [`awayto_cloud::CloudClients`] bundle.
//!
//! # Failure policies
//!
//! Each step carries an explicit [`FailurePolicy`]. Provisioning and packaging
//! steps are always `fatal`; local and deployment steps default to `continue`
//! and record their failure in the [`InstallReport`]. Status query and archive
//! errors end the run under either policy.
//!
//! # Example
//!
//! ```ignore
//! use awayto_install::{Installer, InstallerConfig};
//!
//! let config = InstallerConfig::load()?;
//! let installer = Installer::with_shell_tasks(clients, config);
//! let report = installer.run().await?;
//! println!("Site available at {}", report.website());
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod installer;
pub mod local;
pub mod packager;
pub mod pipeline;
pub mod poller;
pub mod resources;
pub mod seed;
pub mod stack;
pub mod steps;
pub mod template;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::InstallerConfig;
pub use error::{InstallError, InstallResult};
pub use installer::{InstallReport, Installer};
pub use local::{LocalTasks, ShellTasks};
pub use pipeline::{merge_environment, Deployed, DeploymentPipeline};
pub use poller::Poller;
pub use resources::{ResourceProvisioner, RoleOutcome};
pub use seed::EnvironmentSeed;
pub use stack::{StackDeployer, StackStatusKind};
pub use steps::{FailurePolicy, StepLog, StepName, StepOutcome, StepPolicies, StepReport};
pub use types::{resolve_region, InstallConfig, ProvisionedResourceMap, RunIdentity};
