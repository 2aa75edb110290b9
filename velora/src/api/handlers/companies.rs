//! Company records and tenant provisioning.
//!
//! Every admin sees and manages only the companies they created. A company that belongs to
//! another admin is reported as not found.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{error, info};

use crate::{
    AppState,
    api::{
        handlers::missing,
        models::{
            companies::{CompanyCreate, CompanyResponse, CompanyUpdate},
            pagination::{PaginatedResponse, Pagination},
        },
    },
    auth::{current_user::CurrentAdmin, password},
    db::{
        errors::DbError,
        handlers::{Companies, Repository, companies::CompanyFilter},
        models::companies::{CompanyCreateDBRequest, CompanyDBResponse, CompanyUpdateDBRequest, DEFAULT_ALLOWED_TRANSACTIONS},
    },
    errors::Error,
    tenancy::TenantDbName,
    types::CompanyId,
};

async fn insert_company(state: &AppState, request: &CompanyCreateDBRequest, is_active: Option<bool>) -> Result<CompanyDBResponse, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let company = Companies::new(&mut tx).create(request).await?;
    let company = if is_active == Some(false) {
        Companies::new(&mut tx)
            .update(
                company.id,
                &CompanyUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?
    } else {
        company
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(company)
}

async fn hash_password(state: &AppState, password: String) -> Result<String, Error> {
    let rules = state.config.auth.password.clone();
    tokio::task::spawn_blocking(move || password::hash_new_password(&password, &rules))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Load a company and check that `admin` owns it.
async fn owned_company(companies: &mut Companies<'_>, admin: &CurrentAdmin, id: CompanyId) -> Result<CompanyDBResponse, Error> {
    companies
        .get_by_id(id)
        .await?
        .filter(|company| company.admin_id == admin.id)
        .ok_or_else(|| missing("Company", id))
}

/// List the companies owned by the calling admin
#[utoipa::path(
    get,
    path = "/admin/api/v1/companies",
    tag = "companies",
    params(Pagination),
    responses(
        (status = 200, description = "Companies owned by the caller", body = PaginatedResponse<CompanyResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    admin: CurrentAdmin,
) -> Result<Json<PaginatedResponse<CompanyResponse>>, Error> {
    let (skip, limit) = pagination.params();
    let filter = CompanyFilter::new(skip, limit).owned_by(admin.id);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Companies::new(&mut conn);
    let companies = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = companies.into_iter().map(CompanyResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Create a company and provision its database
///
/// A known duplicate email fails before any database is created. The record is written once the
/// tenant database is fully migrated, and the database is dropped again if that write fails.
#[utoipa::path(
    post,
    path = "/admin/api/v1/companies",
    tag = "companies",
    request_body = CompanyCreate,
    responses(
        (status = 201, description = "Company created and its database provisioned", body = CompanyResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Company email already exists"),
        (status = 500, description = "Provisioning failed"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_company(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(request): Json<CompanyCreate>,
) -> Result<(StatusCode, Json<CompanyResponse>), Error> {
    let password_hash = hash_password(&state, request.password).await?;

    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        if Companies::new(&mut conn).get_by_email(&request.email).await?.is_some() {
            return Err(Error::Database(DbError::UniqueViolation {
                constraint: Some("companies_email_key".to_string()),
                table: Some("companies".to_string()),
                message: "duplicate company email".to_string(),
                conflicting_value: Some(request.email),
            }));
        }
    }

    // No global connection is held while provisioning: CREATE DATABASE needs one of its own.
    let db_name = TenantDbName::generate();
    state.provisioner.provision(&db_name).await?;

    let create = CompanyCreateDBRequest {
        admin_id: admin.id,
        email: request.email,
        name: request.name,
        password_hash,
        profile: request.profile.into(),
        db_name: db_name.clone(),
        allowed_transactions: request
            .allowed_transactions
            .unwrap_or_else(|| DEFAULT_ALLOWED_TRANSACTIONS.iter().map(|s| s.to_string()).collect()),
    };
    let company = match insert_company(&state, &create, request.is_active).await {
        Ok(company) => company,
        Err(e) => {
            error!(db_name = %db_name, error = %e, "Failed to record company, dropping its database");
            if let Err(cleanup) = state.provisioner.deprovision(&db_name).await {
                error!(db_name = %db_name, error = %cleanup, "Failed to drop orphaned tenant database");
            }
            return Err(e);
        }
    };

    info!(company_id = %company.id, db_name = %db_name, "Created company");
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

/// Update a company
///
/// The tenant database name cannot be changed.
#[utoipa::path(
    put,
    path = "/admin/api/v1/companies/{id}",
    tag = "companies",
    request_body = CompanyUpdate,
    params(("id" = uuid::Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Company not found"),
        (status = 409, description = "Company email already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(company_id = %id))]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    admin: CurrentAdmin,
    Json(request): Json<CompanyUpdate>,
) -> Result<Json<CompanyResponse>, Error> {
    let password_hash = match request.password {
        Some(password) => Some(hash_password(&state, password).await?),
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Companies::new(&mut conn);
    owned_company(&mut repo, &admin, id).await?;

    let company = repo
        .update(
            id,
            &CompanyUpdateDBRequest {
                email: request.email,
                name: request.name,
                password_hash,
                profile: request.profile.into(),
                is_active: request.is_active,
                allowed_transactions: request.allowed_transactions,
            },
        )
        .await?;

    Ok(Json(CompanyResponse::from(company)))
}

/// Delete a company record
///
/// The company's database is left on the server; only the cached connection is closed.
#[utoipa::path(
    delete,
    path = "/admin/api/v1/companies/{id}",
    tag = "companies",
    params(("id" = uuid::Uuid, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Company not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(company_id = %id))]
pub async fn delete_company(State(state): State<AppState>, Path(id): Path<CompanyId>, admin: CurrentAdmin) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Companies::new(&mut conn);
    let company = owned_company(&mut repo, &admin, id).await?;

    if !repo.delete(id).await? {
        return Err(missing("Company", id));
    }
    state.registry.evict(&company.db_name).await;

    info!(db_name = %company.db_name, "Deleted company record");
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a company between active and inactive
#[utoipa::path(
    patch,
    path = "/admin/api/v1/companies/{id}/toggle-status",
    tag = "companies",
    params(("id" = uuid::Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Status toggled", body = CompanyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Company not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(company_id = %id))]
pub async fn toggle_company_status(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    admin: CurrentAdmin,
) -> Result<Json<CompanyResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Companies::new(&mut conn);
    owned_company(&mut repo, &admin, id).await?;

    let company = repo.toggle_status(id).await?;
    Ok(Json(CompanyResponse::from(company)))
}
