use std::sync::Arc;

use thiserror::Error;

/// Failures of the tenant database lifecycle: naming, connecting, provisioning and migrating.
#[derive(Error, Debug)]
pub enum TenantError {
    #[error("invalid tenant database name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("tenant database {db_name} already exists")]
    AlreadyExists { db_name: String },

    /// Opening the pool failed. The source is shared because concurrent callers waiting on the
    /// same open all receive the same error.
    #[error("failed to connect to tenant database {db_name}")]
    Connect {
        db_name: String,
        #[source]
        source: Arc<sqlx::Error>,
    },

    #[error("provisioning tenant database {db_name} failed at step '{step}'")]
    Provision {
        db_name: String,
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("tenant migration v{version} ({description}) failed")]
    Migration {
        version: i64,
        description: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl TenantError {
    /// Whether the failure is the tenant database being unreachable rather than a bad request
    /// or a bug.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TenantError::Connect { .. })
    }
}
