//! Cloud provider seams for the awayto installer.
//!
//! Every provider API the installer talks to sits behind its own async
//! trait, so the orchestration code never holds a concrete SDK client. A run
//! receives a [`CloudClients`] bundle and hands each component only the
//! handles it needs.
//!
//! # Backends
//!
//! - **AWS** (`aws` feature, default): thin wrappers over the official AWS
//!   SDK clients, built from a single shared `SdkConfig`.
//! - **Memory** (`memory` feature): an in-memory recording backend with
//!   scripted status sequences, used to drive the installer in tests.
//!
//! # APIs
//!
//! | Trait | Provider service |
//! |-------|------------------|
//! | [`DatabaseApi`] | RDS instance lifecycle |
//! | [`StackApi`] | CloudFormation stacks |
//! | [`ParameterStore`] | SSM parameter store |
//! | [`IdentityApi`] | IAM roles and policies |
//! | [`ObjectStorage`] | S3 buckets and objects |
//! | [`FunctionApi`] | Lambda configuration and invocation |
//! | [`ZoneApi`] | EC2 availability zones |

mod clients;
mod error;
mod traits;
mod types;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "memory")]
mod memory;

pub use clients::CloudClients;
pub use error::{CloudError, CloudResult};
pub use traits::{
    DatabaseApi, FunctionApi, IdentityApi, ObjectStorage, ParameterStore, StackApi, ZoneApi,
};
pub use types::{
    CreateDbInstance, CreateStack, DbInstanceOffering, DbInstanceState, FunctionConfiguration,
    Parameter, StackResource, StackState,
};

#[cfg(feature = "memory")]
pub use memory::{CloudCall, MemoryCloud};
