//! Request tenant resolution.
//!
//! [`Tenant`] routes a company-surface request to the company's own database. The database
//! name comes from the `db_name` claim of the caller's session token; the company record is not
//! consulted again, so a resolved request costs at most one pool open and usually none.

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::{
    AppState,
    auth::session::{self, SessionKind},
    errors::{Error, Result},
    tenancy::{TenantDbName, TenantHandle},
    types::CompanyId,
};

/// A company request bound to its tenant database.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub company_id: CompanyId,
    pub email: String,
    pub handle: TenantHandle,
}

impl Tenant {
    pub fn db_name(&self) -> &TenantDbName {
        self.handle.db_name()
    }

    pub fn pool(&self) -> &PgPool {
        self.handle.pool()
    }
}

fn rejected(message: &str) -> Error {
    Error::Unauthenticated {
        message: Some(message.to_string()),
    }
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = session::claims_from_parts(parts, &state.config)?;
        if claims.kind != SessionKind::Company {
            return Err(rejected("Company session required"));
        }

        // Validate before any connection is attempted.
        let raw = claims.db_name.ok_or_else(|| rejected("Session has no company database"))?;
        let db_name = TenantDbName::parse(raw).map_err(|_| rejected("Session has an invalid company database"))?;

        let handle = state.registry.get(&db_name).await?;
        debug!(db_name = %db_name, company_id = %claims.sub, "Resolved tenant");

        Ok(Tenant {
            company_id: claims.sub,
            email: claims.email,
            handle,
        })
    }
}
