use axum::{
    Json,
    extract::{Path, Query},
    http::StatusCode,
};
use tracing::info;

use crate::{
    api::{
        handlers::{missing, not_found},
        models::{
            items::{ItemCreate, ItemResponse, ItemUpdate},
            pagination::{ListQuery, PaginatedResponse},
        },
    },
    auth::tenant::Tenant,
    db::handlers::{Items, Repository},
    errors::Error,
    types::ItemId,
};

/// List items
#[utoipa::path(
    get,
    path = "/company/api/v1/items",
    tag = "items",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of items, optionally filtered by code or name", body = PaginatedResponse<ItemResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Company database unavailable"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_items(Query(query): Query<ListQuery>, tenant: Tenant) -> Result<Json<PaginatedResponse<ItemResponse>>, Error> {
    let filter = query.filter();
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Items::new(&mut conn);
    let items = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = items.into_iter().map(ItemResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, filter.skip, filter.limit)))
}

/// Create an item
///
/// When `taxId` is given, the linked tax rate's current value is stored as the item's tax.
#[utoipa::path(
    post,
    path = "/company/api/v1/items",
    tag = "items",
    request_body = ItemCreate,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid input or unknown linked record"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Item code already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_item(tenant: Tenant, Json(request): Json<ItemCreate>) -> Result<(StatusCode, Json<ItemResponse>), Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn).create(&request.into()).await?;

    info!(item_code = %item.item_code, "Created item");
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// Get an item
#[utoipa::path(
    get,
    path = "/company/api/v1/items/{id}",
    tag = "items",
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn get_item(Path(id): Path<ItemId>, tenant: Tenant) -> Result<Json<ItemResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn).get_by_id(id).await?.ok_or_else(|| missing("Item", id))?;
    Ok(Json(ItemResponse::from(item)))
}

/// Update an item
#[utoipa::path(
    put,
    path = "/company/api/v1/items/{id}",
    tag = "items",
    request_body = ItemUpdate,
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item code already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn update_item(Path(id): Path<ItemId>, tenant: Tenant, Json(request): Json<ItemUpdate>) -> Result<Json<ItemResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(not_found("Item", id))?;
    Ok(Json(ItemResponse::from(item)))
}

/// Delete an item
///
/// Items that appear on a sale cannot be deleted.
#[utoipa::path(
    delete,
    path = "/company/api/v1/items/{id}",
    tag = "items",
    params(("id" = uuid::Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, description = "Item has been sold"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Item not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(item_id = %id))]
pub async fn delete_item(Path(id): Path<ItemId>, tenant: Tenant) -> Result<StatusCode, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Items::new(&mut conn).delete(id).await? {
        return Err(missing("Item", id));
    }
    Ok(StatusCode::NO_CONTENT)
}
