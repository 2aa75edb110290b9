use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    auth::session::{self, SessionKind},
    errors::{Error, Result},
    types::AdminId,
};

/// The admin behind an admin-surface request.
///
/// Extracted from the bearer session token; company tokens are rejected.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: AdminId,
    pub email: String,
}

impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let claims = session::claims_from_parts(parts, &state.config)?;
        if claims.kind != SessionKind::Admin {
            trace!(kind = ?claims.kind, "Rejected non-admin session on admin route");
            return Err(Error::Unauthenticated {
                message: Some("Admin session required".to_string()),
            });
        }

        Ok(CurrentAdmin {
            id: claims.sub,
            email: claims.email,
        })
    }
}
