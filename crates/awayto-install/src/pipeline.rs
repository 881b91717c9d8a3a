//! Deployment of the packaged API and final database wiring.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use awayto_cloud::{
    CloudClients, DatabaseApi, DbInstanceState, FunctionApi, ObjectStorage, Parameter,
    ParameterStore,
};
use tracing::{debug, info, warn};

use crate::error::{InstallError, InstallResult};
use crate::poller::Poller;
use crate::resources::CODE_KEY;
use crate::types::RunIdentity;

/// Environment variable carrying the database host into the function.
pub const HOST_VARIABLE: &str = "PGHOST";

/// Event payload asking the function to run its deploy action.
pub const DEPLOY_PAYLOAD: &str =
    r#"{"httpMethod":"GET","pathParameters":{"proxy":"deploy"},"body":{}}"#;

/// Result of a completed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    /// Function that received the new code.
    pub function_name: String,
    /// Database host wired into the function and parameter store.
    pub database_host: String,
}

/// Overlay the database host on a function's existing environment.
#[must_use]
pub fn merge_environment(
    existing: &BTreeMap<String, String>,
    host: &str,
) -> BTreeMap<String, String> {
    let mut merged = existing.clone();
    merged.insert(HOST_VARIABLE.to_owned(), host.to_owned());
    merged
}

/// Uploads the API package, updates the function and finalises database wiring.
pub struct DeploymentPipeline {
    storage: Arc<dyn ObjectStorage>,
    functions: Arc<dyn FunctionApi>,
    database: Arc<dyn DatabaseApi>,
    parameters: Arc<dyn ParameterStore>,
    poller: Poller,
}

impl DeploymentPipeline {
    /// Create a pipeline from the provider handles it uses.
    #[must_use]
    pub fn new(clients: &CloudClients, poller: Poller) -> Self {
        Self {
            storage: Arc::clone(&clients.storage),
            functions: Arc::clone(&clients.functions),
            database: Arc::clone(&clients.database),
            parameters: Arc::clone(&clients.parameters),
            poller,
        }
    }

    /// Deploy `archive` to `function_name` and wire in the database endpoint.
    ///
    /// Steps run strictly in order:
    /// 1. Upload the archive to the staging bucket and remove the local copy
    /// 2. Point the function code at the uploaded archive
    /// 3. Wait for the database to become available
    /// 4. Reset the master password
    /// 5. Wait for the database again
    /// 6. Merge the database host into the function environment
    /// 7. Invoke the function's deploy action without waiting for a response
    /// 8. Overwrite the placeholder host parameter
    pub async fn deploy(
        &self,
        identity: &RunIdentity,
        function_name: &str,
        archive: &Path,
        db_password: &str,
    ) -> InstallResult<Deployed> {
        let staging = identity.lambda_bucket();

        self.upload_archive(&staging, archive).await?;

        info!(function = %function_name, bucket = %staging, "updating function code");
        self.functions
            .update_code(function_name, &staging, CODE_KEY)
            .await?;

        info!(id = %identity, "checking database availability");
        let first = self.await_database(identity).await?;

        info!(id = %identity, "updating database password");
        self.database
            .modify_master_password(identity.as_str(), db_password)
            .await?;

        info!(id = %identity, "waiting for database to be ready");
        let ready = self.await_database(identity).await?;

        let host = ready
            .endpoint
            .or(first.endpoint)
            .ok_or_else(|| InstallError::MissingEndpoint(identity.to_string()))?;

        let current = self.functions.get_configuration(function_name).await?;
        let variables = merge_environment(&current.environment, &host);
        debug!(function = %function_name, count = variables.len(), "writing function environment");
        self.functions
            .update_environment(function_name, &variables)
            .await?;

        info!(function = %function_name, "invoking deploy action");
        self.functions
            .invoke_event(function_name, DEPLOY_PAYLOAD.as_bytes().to_vec())
            .await?;

        self.parameters
            .put_parameter(&Parameter::new(identity.parameter_name("PGHOST"), &host).overwriting())
            .await?;

        info!(id = %identity, host = %host, "database endpoint wired");
        Ok(Deployed {
            function_name: function_name.to_owned(),
            database_host: host,
        })
    }

    async fn upload_archive(&self, bucket: &str, archive: &Path) -> InstallResult<()> {
        let body = tokio::fs::read(archive).await?;
        info!(bucket = %bucket, bytes = body.len(), "uploading api package");
        self.storage.put_object(bucket, CODE_KEY, body).await?;

        if let Err(e) = tokio::fs::remove_file(archive).await {
            warn!(archive = %archive.display(), error = %e, "failed to remove local archive");
        }
        Ok(())
    }

    async fn await_database(&self, identity: &RunIdentity) -> InstallResult<DbInstanceState> {
        let id = identity.as_str();
        let database = &self.database;

        self.poller
            .wait_until(
                "database",
                move || database.describe_instance(id),
                |state: &DbInstanceState| state.status.eq_ignore_ascii_case("available"),
            )
            .await
    }
}
