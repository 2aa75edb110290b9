use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::current_user::CurrentAdmin,
    errors::Error,
    tenancy::migrations::{self, MigrationReport, TENANT_MIGRATIONS},
};

/// Apply pending schema migrations to every company database
///
/// Tenants that fail are listed in the report; the others are still migrated.
#[utoipa::path(
    post,
    path = "/admin/api/v1/tenants/migrate",
    tag = "tenants",
    responses(
        (status = 200, description = "Migration run finished", body = MigrationReport),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn migrate_tenants(State(state): State<AppState>, admin: CurrentAdmin) -> Result<Json<MigrationReport>, Error> {
    let report = migrations::migrate_all(&state.db, &state.registry, TENANT_MIGRATIONS).await?;
    Ok(Json(report))
}
