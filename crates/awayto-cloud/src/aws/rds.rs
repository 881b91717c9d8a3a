//! RDS database instances.

use async_trait::async_trait;
use aws_sdk_rds::Client;
use tracing::debug;

use super::sdk_error;
use crate::error::{CloudError, CloudResult};
use crate::traits::DatabaseApi;
use crate::types::{CreateDbInstance, DbInstanceOffering, DbInstanceState};

/// RDS backed [`DatabaseApi`].
#[derive(Debug, Clone)]
pub struct AwsDatabase {
    client: Client,
}

impl AwsDatabase {
    /// Create a wrapper from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl DatabaseApi for AwsDatabase {
    async fn orderable_offerings(&self, engine: &str) -> CloudResult<Vec<DbInstanceOffering>> {
        let mut offerings = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_orderable_db_instance_options()
                .engine(engine)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_error("rds:DescribeOrderableDBInstanceOptions", &e))?;

            for option in response.orderable_db_instance_options() {
                let (Some(engine), Some(version), Some(class), Some(storage)) = (
                    option.engine(),
                    option.engine_version(),
                    option.db_instance_class(),
                    option.storage_type(),
                ) else {
                    continue;
                };

                offerings.push(DbInstanceOffering {
                    engine: engine.to_owned(),
                    engine_version: version.to_owned(),
                    instance_class: class.to_owned(),
                    storage_type: storage.to_owned(),
                });
            }

            match response.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_owned()),
                _ => break,
            }
        }

        debug!(engine = %engine, count = offerings.len(), "listed orderable offerings");
        Ok(offerings)
    }

    async fn create_instance(&self, request: &CreateDbInstance) -> CloudResult<()> {
        self.client
            .create_db_instance()
            .db_instance_identifier(&request.identifier)
            .db_instance_class(&request.instance_class)
            .engine(&request.engine)
            .engine_version(&request.engine_version)
            .allocated_storage(request.allocated_storage_gb)
            .max_allocated_storage(request.max_allocated_storage_gb)
            .backup_retention_period(request.backup_retention_days)
            .db_name(&request.database_name)
            .deletion_protection(false)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .publicly_accessible(false)
            .set_availability_zone(request.availability_zone.clone())
            .send()
            .await
            .map_err(|e| sdk_error("rds:CreateDBInstance", &e))?;

        Ok(())
    }

    async fn modify_master_password(&self, identifier: &str, password: &str) -> CloudResult<()> {
        self.client
            .modify_db_instance()
            .db_instance_identifier(identifier)
            .master_user_password(password)
            .send()
            .await
            .map_err(|e| sdk_error("rds:ModifyDBInstance", &e))?;

        Ok(())
    }

    async fn describe_instance(&self, identifier: &str) -> CloudResult<DbInstanceState> {
        const OPERATION: &str = "rds:DescribeDBInstances";

        let response = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| sdk_error(OPERATION, &e))?;

        let instance = response
            .db_instances()
            .first()
            .ok_or_else(|| CloudError::missing(OPERATION, "instance"))?;

        let status = instance
            .db_instance_status()
            .ok_or_else(|| CloudError::missing(OPERATION, "status"))?;

        Ok(DbInstanceState {
            identifier: identifier.to_owned(),
            status: status.to_owned(),
            endpoint: instance
                .endpoint()
                .and_then(|endpoint| endpoint.address())
                .map(str::to_owned),
        })
    }
}
