//! Creation of the primitive cloud resources for a run.
//!
//! Database, parameters, execution role and buckets are independent of each
//! other and are created in sequence. Every failure is fatal except the
//! not-found answer of the role lookup, which selects the create branch.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use awayto_cloud::{
    CloudClients, CreateDbInstance, DatabaseApi, IdentityApi, ObjectStorage, Parameter,
    ParameterStore, ZoneApi,
};
use tracing::{debug, info};

use crate::config::{DatabaseConfig, RoleConfig};
use crate::error::{InstallError, InstallResult};
use crate::template;
use crate::types::{InstallConfig, RunIdentity};

/// Placeholder stored for the database host until the instance is available.
pub const HOST_PLACEHOLDER: &str = "tempvalue";

/// Object key of the rendered template in the staging bucket.
pub const TEMPLATE_KEY: &str = "template.yaml";

/// Object key of function code in the staging bucket.
pub const CODE_KEY: &str = "lambda.zip";

/// Index document served by the website bucket.
pub const INDEX_DOCUMENT: &str = "index.html";

const LAMBDA_TRUST_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"lambda.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

/// Whether the execution role had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    /// The role already existed and was left untouched.
    Existing,
    /// The role was created and its policies attached.
    Created,
}

/// Engine and version selected for the database instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOffering {
    /// Engine name.
    pub engine: String,
    /// Engine version.
    pub engine_version: String,
}

/// Creates databases, parameters, roles and buckets.
pub struct ResourceProvisioner {
    database: Arc<dyn DatabaseApi>,
    parameters: Arc<dyn ParameterStore>,
    identity: Arc<dyn IdentityApi>,
    storage: Arc<dyn ObjectStorage>,
    zones: Arc<dyn ZoneApi>,
    database_config: DatabaseConfig,
}

impl ResourceProvisioner {
    /// Create a provisioner from the provider handles it uses.
    #[must_use]
    pub fn new(clients: &CloudClients, database_config: DatabaseConfig) -> Self {
        Self {
            database: Arc::clone(&clients.database),
            parameters: Arc::clone(&clients.parameters),
            identity: Arc::clone(&clients.identity),
            storage: Arc::clone(&clients.storage),
            zones: Arc::clone(&clients.zones),
            database_config,
        }
    }

    /// Pick an availability zone of `region` by index.
    pub async fn select_zone(&self, region: &str, index: usize) -> InstallResult<String> {
        let zones = self.zones.availability_zones(region).await?;

        if zones.is_empty() {
            return Err(InstallError::config(format!(
                "no availability zones reported for {region}"
            )));
        }

        let available = zones.len();
        zones
            .into_iter()
            .nth(index)
            .ok_or_else(|| InstallError::UnknownZone {
                region: region.to_owned(),
                index,
                available,
            })
    }

    /// Find the engine version offered for the configured instance class and storage type.
    pub async fn select_offering(&self) -> InstallResult<SelectedOffering> {
        let cfg = &self.database_config;
        let offerings = self.database.orderable_offerings(&cfg.engine).await?;

        debug!(engine = %cfg.engine, count = offerings.len(), "listed orderable offerings");

        offerings
            .into_iter()
            .find(|o| o.instance_class == cfg.instance_class && o.storage_type == cfg.storage_type)
            .map(|o| SelectedOffering {
                engine: o.engine,
                engine_version: o.engine_version,
            })
            .ok_or_else(|| InstallError::NoOffering {
                engine: cfg.engine.clone(),
                instance_class: cfg.instance_class.clone(),
                storage_type: cfg.storage_type.clone(),
            })
    }

    /// Start creating the database instance. Does not wait for it to become available.
    pub async fn create_database(
        &self,
        identity: &RunIdentity,
        install: &InstallConfig,
        availability_zone: Option<String>,
    ) -> InstallResult<()> {
        let offering = self.select_offering().await?;
        let cfg = &self.database_config;

        let request = CreateDbInstance {
            identifier: identity.to_string(),
            engine: offering.engine,
            engine_version: offering.engine_version,
            instance_class: cfg.instance_class.clone(),
            allocated_storage_gb: cfg.allocated_storage_gb,
            max_allocated_storage_gb: cfg.max_allocated_storage_gb,
            backup_retention_days: cfg.backup_retention_days,
            database_name: identity.to_string(),
            master_username: install.db_username.clone(),
            master_password: install.db_password.clone(),
            availability_zone,
        };

        info!(
            id = %identity,
            engine_version = %request.engine_version,
            zone = ?request.availability_zone,
            "creating database instance"
        );

        self.database.create_instance(&request).await?;
        Ok(())
    }

    /// Write the database connection parameters, each suffixed with the run identity.
    ///
    /// The host is a placeholder until the deployment pipeline overwrites it.
    pub async fn create_parameter_entries(
        &self,
        identity: &RunIdentity,
        username: &str,
        password: &str,
    ) -> InstallResult<()> {
        let port = self.database_config.port.to_string();
        let entries = [
            ("PGHOST", HOST_PLACEHOLDER),
            ("PGPORT", port.as_str()),
            ("PGUSER", username),
            ("PGPASSWORD", password),
            ("PGDATABASE", self.database_config.database_name.as_str()),
        ];

        for (base, value) in entries {
            let name = identity.parameter_name(base);
            debug!(parameter = %name, "writing parameter");
            self.parameters
                .put_parameter(&Parameter::new(name, value))
                .await?;
        }

        info!(id = %identity, count = entries.len(), "parameters written");
        Ok(())
    }

    /// Ensure the shared execution role exists.
    ///
    /// A role that already exists is reused untouched. A not-found lookup
    /// creates it and attaches every configured policy. Any other lookup
    /// failure is returned.
    pub async fn ensure_execution_role(&self, role: &RoleConfig) -> InstallResult<RoleOutcome> {
        match self.identity.get_role(&role.name).await {
            Ok(()) => {
                info!(role = %role.name, "execution role exists");
                Ok(RoleOutcome::Existing)
            }
            Err(e) if e.is_not_found() => {
                info!(role = %role.name, "creating execution role");
                self.identity
                    .create_role(&role.name, LAMBDA_TRUST_POLICY)
                    .await?;

                for arn in &role.policy_arns {
                    debug!(role = %role.name, policy = %arn, "attaching policy");
                    self.identity.attach_role_policy(&role.name, arn).await?;
                }

                Ok(RoleOutcome::Created)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create the staging and website buckets and upload the template and bootstrap code.
    pub async fn create_storage_buckets(
        &self,
        identity: &RunIdentity,
        template_path: &Path,
        bootstrap_code: &Path,
    ) -> InstallResult<()> {
        let staging = identity.lambda_bucket();
        let website = identity.webapp_bucket();

        let values = BTreeMap::from([("id", identity.as_str())]);
        let rendered = template::render_file(template_path, &values).await?;
        let code = tokio::fs::read(bootstrap_code).await?;

        info!(bucket = %staging, "creating staging bucket");
        self.storage.create_bucket(&staging).await?;
        self.storage
            .put_object(&staging, TEMPLATE_KEY, rendered.into_bytes())
            .await?;
        self.storage.put_object(&staging, CODE_KEY, code).await?;

        info!(bucket = %website, "creating website bucket");
        self.storage.create_bucket(&website).await?;
        self.storage
            .put_bucket_website(&website, INDEX_DOCUMENT)
            .await?;
        self.storage.allow_public_policy(&website).await?;
        self.storage
            .put_bucket_policy(&website, &public_read_policy(&website))
            .await?;

        Ok(())
    }
}

/// Bucket policy granting anonymous `GetObject` on every key.
#[must_use]
pub fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2008-10-17",
        "Statement": [{
            "Sid": "AllowPublicRead",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": format!("arn:aws:s3:::{bucket}/*"),
        }],
    })
    .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use awayto_cloud::{CloudCall, DbInstanceOffering, MemoryCloud};

    use super::*;

    fn offering(class: &str, storage: &str, version: &str) -> DbInstanceOffering {
        DbInstanceOffering {
            engine: "postgres".to_owned(),
            engine_version: version.to_owned(),
            instance_class: class.to_owned(),
            storage_type: storage.to_owned(),
        }
    }

    fn provisioner(cloud: MemoryCloud) -> (Arc<MemoryCloud>, ResourceProvisioner) {
        let cloud = Arc::new(cloud);
        let clients = CloudClients::uniform(Arc::clone(&cloud));
        (cloud, ResourceProvisioner::new(&clients, DatabaseConfig::default()))
    }

    #[tokio::test]
    async fn offering_matches_class_and_storage() {
        let (_, provisioner) = provisioner(
            MemoryCloud::new()
                .with_offering(offering("db.t3.large", "standard", "15.2"))
                .with_offering(offering("db.t2.micro", "gp2", "15.3"))
                .with_offering(offering("db.t2.micro", "standard", "14.9")),
        );

        let selected = provisioner.select_offering().await.unwrap();
        assert_eq!(selected.engine_version, "14.9");
    }

    #[tokio::test]
    async fn missing_offering_is_fatal() {
        let (_, provisioner) = provisioner(
            MemoryCloud::new().with_offering(offering("db.t3.large", "standard", "15.2")),
        );
        assert!(matches!(
            provisioner.select_offering().await,
            Err(InstallError::NoOffering { .. })
        ));
    }

    #[tokio::test]
    async fn zone_selection_checks_bounds() {
        let (_, provisioner) =
            provisioner(MemoryCloud::new().with_zones("us-east-1", &["us-east-1a", "us-east-1b"]));

        assert_eq!(provisioner.select_zone("us-east-1", 1).await.unwrap(), "us-east-1b");
        assert!(matches!(
            provisioner.select_zone("us-east-1", 2).await,
            Err(InstallError::UnknownZone { available: 2, .. })
        ));
        assert!(matches!(
            provisioner.select_zone("eu-west-1", 0).await,
            Err(InstallError::Config(_))
        ));
    }

    #[tokio::test]
    async fn parameters_use_placeholder_host() {
        let (cloud, provisioner) = provisioner(MemoryCloud::new());
        let identity = RunIdentity::new("demo", "dev", 1);

        provisioner
            .create_parameter_entries(&identity, "postgres", "postgres1")
            .await
            .unwrap();

        assert_eq!(cloud.parameter("PGHOST_demodev1").as_deref(), Some(HOST_PLACEHOLDER));
        assert_eq!(cloud.parameter("PGPORT_demodev1").as_deref(), Some("5432"));
        assert_eq!(cloud.parameter("PGUSER_demodev1").as_deref(), Some("postgres"));
        assert_eq!(cloud.parameter("PGPASSWORD_demodev1").as_deref(), Some("postgres1"));
        assert_eq!(cloud.parameter("PGDATABASE_demodev1").as_deref(), Some("postgres"));
    }

    #[tokio::test]
    async fn buckets_are_created_and_populated() {
        let dir = tempfile::TempDir::new().unwrap();
        let template = dir.path().join("template.yaml.template");
        let code = dir.path().join("lambda.zip");
        std::fs::write(&template, "Function: ##id##Resource").unwrap();
        std::fs::write(&code, b"PK").unwrap();

        let (cloud, provisioner) = provisioner(MemoryCloud::new());
        let identity = RunIdentity::new("demo", "dev", 1);

        provisioner
            .create_storage_buckets(&identity, &template, &code)
            .await
            .unwrap();

        assert_eq!(
            cloud.object("demodev1-lambda", TEMPLATE_KEY).unwrap(),
            b"Function: demodev1Resource".to_vec()
        );
        assert_eq!(cloud.object("demodev1-lambda", CODE_KEY).unwrap(), b"PK".to_vec());

        let policy: serde_json::Value =
            serde_json::from_str(&cloud.bucket_policy("demodev1-webapp").unwrap()).unwrap();
        assert_eq!(policy["Version"], "2008-10-17");
        assert_eq!(policy["Statement"][0]["Action"], "s3:GetObject");
        assert_eq!(
            policy["Statement"][0]["Resource"],
            "arn:aws:s3:::demodev1-webapp/*"
        );
        assert_eq!(
            cloud.count(|c| matches!(c, CloudCall::AllowPublicPolicy { .. })),
            1
        );
    }

    #[tokio::test]
    async fn unresolved_template_stops_before_any_bucket() {
        let dir = tempfile::TempDir::new().unwrap();
        let template = dir.path().join("template.yaml.template");
        let code = dir.path().join("lambda.zip");
        std::fs::write(&template, "Region: ##region##").unwrap();
        std::fs::write(&code, b"PK").unwrap();

        let (cloud, provisioner) = provisioner(MemoryCloud::new());
        let result = provisioner
            .create_storage_buckets(&RunIdentity::new("demo", "dev", 1), &template, &code)
            .await;

        assert!(matches!(result, Err(InstallError::UnresolvedTokens { .. })));
        assert!(cloud.calls().is_empty());
    }
}
