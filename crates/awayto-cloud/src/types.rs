//! Provider-neutral request and response types.

use std::collections::BTreeMap;

/// One orderable database offering (engine, version, class, storage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInstanceOffering {
    /// Engine name, e.g. `postgres`.
    pub engine: String,
    /// Engine version, e.g. `13.4`.
    pub engine_version: String,
    /// Instance class, e.g. `db.t2.micro`.
    pub instance_class: String,
    /// Storage type, e.g. `standard`.
    pub storage_type: String,
}

/// Request to create a database instance.
#[derive(Clone, PartialEq, Eq)]
pub struct CreateDbInstance {
    /// Instance identifier.
    pub identifier: String,
    /// Engine name.
    pub engine: String,
    /// Engine version.
    pub engine_version: String,
    /// Instance class.
    pub instance_class: String,
    /// Initial storage in GB.
    pub allocated_storage_gb: i32,
    /// Storage autoscaling ceiling in GB.
    pub max_allocated_storage_gb: i32,
    /// Automated backup retention in days.
    pub backup_retention_days: i32,
    /// Initial database name.
    pub database_name: String,
    /// Master user name.
    pub master_username: String,
    /// Master user password.
    pub master_password: String,
    /// Availability zone to place the instance in.
    pub availability_zone: Option<String>,
}

impl std::fmt::Debug for CreateDbInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateDbInstance")
            .field("identifier", &self.identifier)
            .field("engine", &self.engine)
            .field("engine_version", &self.engine_version)
            .field("instance_class", &self.instance_class)
            .field("allocated_storage_gb", &self.allocated_storage_gb)
            .field("master_username", &self.master_username)
            .field("availability_zone", &self.availability_zone)
            .finish_non_exhaustive()
    }
}

/// Observed state of a database instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInstanceState {
    /// Instance identifier.
    pub identifier: String,
    /// Provider status string, e.g. `creating` or `available`.
    pub status: String,
    /// Endpoint host, once assigned.
    pub endpoint: Option<String>,
}

impl DbInstanceState {
    /// Create a state without an endpoint.
    #[must_use]
    pub fn new(identifier: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: status.into(),
            endpoint: None,
        }
    }

    /// Set the endpoint host.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Request to create an infrastructure stack from a hosted template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStack {
    /// Stack name.
    pub name: String,
    /// URL of the uploaded template.
    pub template_url: String,
    /// Capabilities acknowledged for the stack, e.g. `CAPABILITY_IAM`.
    pub capabilities: Vec<String>,
    /// On-failure policy, e.g. `DELETE`.
    pub on_failure: String,
    /// Template parameters.
    pub parameters: BTreeMap<String, String>,
}

/// Observed state of a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackState {
    /// Stack name.
    pub name: String,
    /// Provider status string, e.g. `CREATE_IN_PROGRESS`.
    pub status: String,
    /// Reason attached to the status, if any.
    pub reason: Option<String>,
}

impl StackState {
    /// Create a stack state without a reason.
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            reason: None,
        }
    }
}

/// A created stack resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackResource {
    /// Template-declared logical name.
    pub logical_id: String,
    /// Provider-assigned physical identifier.
    pub physical_id: String,
}

impl StackResource {
    /// Create a resource summary.
    #[must_use]
    pub fn new(logical_id: impl Into<String>, physical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            physical_id: physical_id.into(),
        }
    }
}

/// A plain-text parameter store entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: String,
    /// Replace an existing value instead of failing.
    pub overwrite: bool,
}

impl Parameter {
    /// Create a parameter that must not already exist.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            overwrite: false,
        }
    }

    /// Allow the write to replace an existing value.
    #[must_use]
    pub const fn overwriting(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

/// The parts of a function's configuration the installer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionConfiguration {
    /// Function name.
    pub name: String,
    /// Current environment variables.
    pub environment: BTreeMap<String, String>,
}
