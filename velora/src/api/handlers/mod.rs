//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request deserialization
//! - Authentication, through the [`crate::auth::current_user::CurrentAdmin`] and
//!   [`crate::auth::tenant::Tenant`] extractors
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! Admin surface (`/admin/api/v1`):
//!
//! - [`auth`]: Admin and company login, admin registration
//! - [`companies`]: Company records and tenant provisioning
//! - [`tenants`]: Tenant schema migration
//!
//! Company surface (`/company/api/v1`), all running against the caller's tenant database:
//!
//! - [`items`], [`customers`], [`masters`]: Master data CRUD
//! - [`sales`]: Sales entry, the sales report and invoice rendering
//! - [`dashboard`]: Aggregate figures
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the HTTP status code and a
//! user-safe message.

use crate::{db::errors::DbError, errors::Error};
use std::fmt::Display;

pub mod auth;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod items;
pub mod masters;
pub mod sales;
pub mod tenants;

/// Turn a repository `NotFound` into a 404 naming the resource; pass everything else through.
pub(crate) fn not_found(resource: &'static str, id: impl Display) -> impl FnOnce(DbError) -> Error {
    move |err| match err {
        DbError::NotFound => Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    }
}

pub(crate) fn missing(resource: &'static str, id: impl Display) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}
