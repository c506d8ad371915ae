use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Identifier of one schema change, ordered by version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeId {
    pub version: i64,
    pub description: String,
}

impl ChangeId {
    pub fn new(version: i64, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
        }
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.version, self.description.replace(' ', "_"))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Database unreachable: {0}")]
    Connectivity(String),

    #[error("Schema provisioning failed: {0}")]
    Provision(String),

    #[error("Schema change failed: {0}")]
    Apply(String),
}

/// What the readiness orchestrator needs from the database.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn can_connect(&self) -> bool;

    /// Changes not yet applied, in the order they must be applied.
    async fn pending_changes(&self) -> Result<Vec<ChangeId>, SchemaError>;

    async fn apply_pending(&self) -> Result<(), SchemaError>;

    async fn create_if_absent(&self) -> Result<(), SchemaError>;
}
