//! Categories, tax rates and units.
//!
//! These lists are short, so list endpoints return a plain array rather than a paginated
//! envelope. `skip`/`limit` still apply.

use axum::{
    Json,
    extract::{Path, Query},
    http::StatusCode,
};

use crate::{
    api::{
        handlers::{missing, not_found},
        models::{
            masters::{
                CategoryCreate, CategoryResponse, CategoryUpdate, TaxRateCreate, TaxRateResponse, TaxRateUpdate, UnitCreate,
                UnitResponse, UnitUpdate,
            },
            pagination::ListQuery,
        },
    },
    auth::tenant::Tenant,
    db::handlers::{Categories, Repository, TaxRates, Units},
    errors::Error,
    types::{CategoryId, TaxRateId, UnitId},
};

// Categories

#[utoipa::path(
    get,
    path = "/company/api/v1/categories",
    tag = "categories",
    params(ListQuery),
    responses(
        (status = 200, description = "Categories by name", body = [CategoryResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_categories(Query(query): Query<ListQuery>, tenant: Tenant) -> Result<Json<Vec<CategoryResponse>>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = Categories::new(&mut conn).list(&query.filter()).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/company/api/v1/categories",
    tag = "categories",
    request_body = CategoryCreate,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_category(tenant: Tenant, Json(request): Json<CategoryCreate>) -> Result<(StatusCode, Json<CategoryResponse>), Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[utoipa::path(
    get,
    path = "/company/api/v1/categories/{id}",
    tag = "categories",
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(category_id = %id))]
pub async fn get_category(Path(id): Path<CategoryId>, tenant: Tenant) -> Result<Json<CategoryResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| missing("Category", id))?;
    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/company/api/v1/categories/{id}",
    tag = "categories",
    request_body = CategoryUpdate,
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(category_id = %id))]
pub async fn update_category(
    Path(id): Path<CategoryId>,
    tenant: Tenant,
    Json(request): Json<CategoryUpdate>,
) -> Result<Json<CategoryResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(not_found("Category", id))?;
    Ok(Json(CategoryResponse::from(category)))
}

/// Delete a category
///
/// Items in the category are kept and lose their category link.
#[utoipa::path(
    delete,
    path = "/company/api/v1/categories/{id}",
    tag = "categories",
    params(("id" = uuid::Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(category_id = %id))]
pub async fn delete_category(Path(id): Path<CategoryId>, tenant: Tenant) -> Result<StatusCode, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Categories::new(&mut conn).delete(id).await? {
        return Err(missing("Category", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Tax rates

#[utoipa::path(
    get,
    path = "/company/api/v1/taxes",
    tag = "taxes",
    params(ListQuery),
    responses(
        (status = 200, description = "Tax rates, lowest first", body = [TaxRateResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_tax_rates(Query(query): Query<ListQuery>, tenant: Tenant) -> Result<Json<Vec<TaxRateResponse>>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rates = TaxRates::new(&mut conn).list(&query.filter()).await?;
    Ok(Json(rates.into_iter().map(TaxRateResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/company/api/v1/taxes",
    tag = "taxes",
    request_body = TaxRateCreate,
    responses(
        (status = 201, description = "Tax rate created", body = TaxRateResponse),
        (status = 400, description = "Negative rate"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_tax_rate(tenant: Tenant, Json(request): Json<TaxRateCreate>) -> Result<(StatusCode, Json<TaxRateResponse>), Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rate = TaxRates::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(TaxRateResponse::from(rate))))
}

#[utoipa::path(
    get,
    path = "/company/api/v1/taxes/{id}",
    tag = "taxes",
    params(("id" = uuid::Uuid, Path, description = "Tax rate ID")),
    responses(
        (status = 200, description = "Tax rate", body = TaxRateResponse),
        (status = 404, description = "Tax rate not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(tax_rate_id = %id))]
pub async fn get_tax_rate(Path(id): Path<TaxRateId>, tenant: Tenant) -> Result<Json<TaxRateResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rate = TaxRates::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| missing("Tax rate", id))?;
    Ok(Json(TaxRateResponse::from(rate)))
}

/// Update a tax rate
///
/// Items already linked to this rate keep the tax they were saved with.
#[utoipa::path(
    put,
    path = "/company/api/v1/taxes/{id}",
    tag = "taxes",
    request_body = TaxRateUpdate,
    params(("id" = uuid::Uuid, Path, description = "Tax rate ID")),
    responses(
        (status = 200, description = "Tax rate updated", body = TaxRateResponse),
        (status = 404, description = "Tax rate not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(tax_rate_id = %id))]
pub async fn update_tax_rate(
    Path(id): Path<TaxRateId>,
    tenant: Tenant,
    Json(request): Json<TaxRateUpdate>,
) -> Result<Json<TaxRateResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rate = TaxRates::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(not_found("Tax rate", id))?;
    Ok(Json(TaxRateResponse::from(rate)))
}

#[utoipa::path(
    delete,
    path = "/company/api/v1/taxes/{id}",
    tag = "taxes",
    params(("id" = uuid::Uuid, Path, description = "Tax rate ID")),
    responses(
        (status = 204, description = "Tax rate deleted"),
        (status = 404, description = "Tax rate not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(tax_rate_id = %id))]
pub async fn delete_tax_rate(Path(id): Path<TaxRateId>, tenant: Tenant) -> Result<StatusCode, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !TaxRates::new(&mut conn).delete(id).await? {
        return Err(missing("Tax rate", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Units

#[utoipa::path(
    get,
    path = "/company/api/v1/units",
    tag = "units",
    params(ListQuery),
    responses(
        (status = 200, description = "Units by symbol", body = [UnitResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_units(Query(query): Query<ListQuery>, tenant: Tenant) -> Result<Json<Vec<UnitResponse>>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let units = Units::new(&mut conn).list(&query.filter()).await?;
    Ok(Json(units.into_iter().map(UnitResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/company/api/v1/units",
    tag = "units",
    request_body = UnitCreate,
    responses(
        (status = 201, description = "Unit created", body = UnitResponse),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_unit(tenant: Tenant, Json(request): Json<UnitCreate>) -> Result<(StatusCode, Json<UnitResponse>), Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(UnitResponse::from(unit))))
}

#[utoipa::path(
    get,
    path = "/company/api/v1/units/{id}",
    tag = "units",
    params(("id" = uuid::Uuid, Path, description = "Unit ID")),
    responses(
        (status = 200, description = "Unit", body = UnitResponse),
        (status = 404, description = "Unit not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(unit_id = %id))]
pub async fn get_unit(Path(id): Path<UnitId>, tenant: Tenant) -> Result<Json<UnitResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn).get_by_id(id).await?.ok_or_else(|| missing("Unit", id))?;
    Ok(Json(UnitResponse::from(unit)))
}

#[utoipa::path(
    put,
    path = "/company/api/v1/units/{id}",
    tag = "units",
    request_body = UnitUpdate,
    params(("id" = uuid::Uuid, Path, description = "Unit ID")),
    responses(
        (status = 200, description = "Unit updated", body = UnitResponse),
        (status = 404, description = "Unit not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(unit_id = %id))]
pub async fn update_unit(Path(id): Path<UnitId>, tenant: Tenant, Json(request): Json<UnitUpdate>) -> Result<Json<UnitResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let unit = Units::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(not_found("Unit", id))?;
    Ok(Json(UnitResponse::from(unit)))
}

#[utoipa::path(
    delete,
    path = "/company/api/v1/units/{id}",
    tag = "units",
    params(("id" = uuid::Uuid, Path, description = "Unit ID")),
    responses(
        (status = 204, description = "Unit deleted"),
        (status = 404, description = "Unit not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(unit_id = %id))]
pub async fn delete_unit(Path(id): Path<UnitId>, tenant: Tenant) -> Result<StatusCode, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Units::new(&mut conn).delete(id).await? {
        return Err(missing("Unit", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
