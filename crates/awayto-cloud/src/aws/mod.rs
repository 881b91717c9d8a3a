//! AWS SDK backed implementations of the provider traits.
//!
//! Each wrapper owns one SDK client built from a shared `SdkConfig`. Errors
//! are flattened into [`CloudError::Service`] with the full SDK error
//! context; only IAM's `NoSuchEntity` on role lookup becomes
//! [`CloudError::NotFound`].

mod cloudformation;
mod ec2;
mod iam;
mod lambda;
mod rds;
mod s3;
mod ssm;

pub use cloudformation::AwsStacks;
pub use ec2::AwsZones;
pub use iam::AwsIdentity;
pub use lambda::AwsFunctions;
pub use rds::AwsDatabase;
pub use s3::AwsStorage;
pub use ssm::AwsParameters;

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};

use crate::error::CloudError;

/// Flattens an SDK error into a service error carrying the full context chain.
pub(crate) fn sdk_error<E, R>(operation: &'static str, err: &SdkError<E, R>) -> CloudError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    CloudError::service(operation, DisplayErrorContext(err).to_string())
}

/// Reads an accessor whose optionality differs between SDK model versions.
pub(crate) fn field<'a, T: ?Sized>(value: impl Into<Option<&'a T>>) -> Option<&'a T> {
    value.into()
}
