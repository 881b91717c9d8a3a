//! Bundle of provider handles for one installer run.

use std::sync::Arc;

use crate::traits::{
    DatabaseApi, FunctionApi, IdentityApi, ObjectStorage, ParameterStore, StackApi, ZoneApi,
};

/// Provider handles shared by the installer components.
///
/// Each field is an independent seam; components receive the handles they
/// need rather than the whole bundle where practical.
#[derive(Clone)]
pub struct CloudClients {
    /// Database instance API.
    pub database: Arc<dyn DatabaseApi>,
    /// Stack API.
    pub stacks: Arc<dyn StackApi>,
    /// Parameter store.
    pub parameters: Arc<dyn ParameterStore>,
    /// Identity API.
    pub identity: Arc<dyn IdentityApi>,
    /// Object storage.
    pub storage: Arc<dyn ObjectStorage>,
    /// Function API.
    pub functions: Arc<dyn FunctionApi>,
    /// Availability zone lookup.
    pub zones: Arc<dyn ZoneApi>,
}

impl CloudClients {
    /// Builds a bundle where one value backs every API.
    ///
    /// Used with backends that implement all traits on a single type, such
    /// as the in-memory backend.
    pub fn uniform<T>(backend: Arc<T>) -> Self
    where
        T: DatabaseApi
            + StackApi
            + ParameterStore
            + IdentityApi
            + ObjectStorage
            + FunctionApi
            + ZoneApi
            + 'static,
    {
        Self {
            database: backend.clone(),
            stacks: backend.clone(),
            parameters: backend.clone(),
            identity: backend.clone(),
            storage: backend.clone(),
            functions: backend.clone(),
            zones: backend,
        }
    }

    /// Builds a bundle of AWS SDK clients from a loaded SDK configuration.
    #[cfg(feature = "aws")]
    #[must_use]
    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        use crate::aws::{
            AwsDatabase, AwsFunctions, AwsIdentity, AwsParameters, AwsStacks, AwsStorage,
            AwsZones,
        };

        Self {
            database: Arc::new(AwsDatabase::new(config)),
            stacks: Arc::new(AwsStacks::new(config)),
            parameters: Arc::new(AwsParameters::new(config)),
            identity: Arc::new(AwsIdentity::new(config)),
            storage: Arc::new(AwsStorage::new(config)),
            functions: Arc::new(AwsFunctions::new(config)),
            zones: Arc::new(AwsZones::new(config)),
        }
    }
}

impl std::fmt::Debug for CloudClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClients").finish_non_exhaustive()
    }
}
