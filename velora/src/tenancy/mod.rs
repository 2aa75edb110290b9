//! Tenant database lifecycle and routing.
//!
//! Every company owns a dedicated PostgreSQL database on the same server as the global
//! database. This module covers everything about those databases:
//!
//! - [`TenantDbName`]: a validated database identifier
//! - [`TenantRegistry`]: the process-wide cache of per-tenant connection pools
//! - [`Provisioner`]: creates (and on failure, removes) tenant databases
//! - [`migrations`]: the versioned tenant schema and its runner
//!
//! Requests are routed to a tenant by the [`crate::auth::tenant::Tenant`] extractor, which reads
//! the database name from the caller's session and asks the registry for a handle.

pub mod error;
pub mod migrations;
pub mod name;
pub mod provisioner;
pub mod registry;

pub use error::TenantError;
pub use name::TenantDbName;
pub use provisioner::Provisioner;
pub use registry::{TenantConnection, TenantHandle, TenantRegistry};
