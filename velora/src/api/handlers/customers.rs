use axum::{
    Json,
    extract::{Path, Query},
    http::StatusCode,
};

use crate::{
    api::{
        handlers::{missing, not_found},
        models::{
            customers::{CustomerCreate, CustomerResponse, CustomerUpdate},
            pagination::{ListQuery, PaginatedResponse},
        },
    },
    auth::tenant::Tenant,
    db::handlers::{Customers, Repository},
    errors::Error,
    types::CustomerId,
};

/// List customers
#[utoipa::path(
    get,
    path = "/company/api/v1/customers",
    tag = "customers",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of customers, optionally filtered by name or phone", body = PaginatedResponse<CustomerResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_customers(
    Query(query): Query<ListQuery>,
    tenant: Tenant,
) -> Result<Json<PaginatedResponse<CustomerResponse>>, Error> {
    let filter = query.filter();
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    let customers = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = customers.into_iter().map(CustomerResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, filter.skip, filter.limit)))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/company/api/v1/customers",
    tag = "customers",
    request_body = CustomerCreate,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_customer(tenant: Tenant, Json(request): Json<CustomerCreate>) -> Result<(StatusCode, Json<CustomerResponse>), Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let customer = Customers::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

#[utoipa::path(
    get,
    path = "/company/api/v1/customers/{id}",
    tag = "customers",
    params(("id" = uuid::Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = CustomerResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Customer not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(customer_id = %id))]
pub async fn get_customer(Path(id): Path<CustomerId>, tenant: Tenant) -> Result<Json<CustomerResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let customer = Customers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| missing("Customer", id))?;
    Ok(Json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    put,
    path = "/company/api/v1/customers/{id}",
    tag = "customers",
    request_body = CustomerUpdate,
    params(("id" = uuid::Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Customer not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(customer_id = %id))]
pub async fn update_customer(
    Path(id): Path<CustomerId>,
    tenant: Tenant,
    Json(request): Json<CustomerUpdate>,
) -> Result<Json<CustomerResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let customer = Customers::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(not_found("Customer", id))?;
    Ok(Json(CustomerResponse::from(customer)))
}

/// Delete a customer
///
/// Customers with recorded sales cannot be deleted.
#[utoipa::path(
    delete,
    path = "/company/api/v1/customers/{id}",
    tag = "customers",
    params(("id" = uuid::Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 400, description = "Customer has sales"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Customer not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(customer_id = %id))]
pub async fn delete_customer(Path(id): Path<CustomerId>, tenant: Tenant) -> Result<StatusCode, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Customers::new(&mut conn).delete(id).await? {
        return Err(missing("Customer", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestTenants, company_token, create_test_admin, create_test_app, insert_company_record};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_customer_lifecycle(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let company = insert_company_record(&pool, admin.id, &tenants.provision().await).await;
        let token = company_token(&company);
        let (server, state) = create_test_app(pool).await;

        for (name, phone) in [("Asha Rao", "9800000001"), ("Vikram Shah", "9800000002")] {
            server
                .post("/company/api/v1/customers")
                .authorization_bearer(&token)
                .json(&json!({"name": name, "phone": phone}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/company/api/v1/customers?limit=1")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let page: Value = response.json();
        assert_eq!(page["totalCount"], 2);
        assert_eq!(page["limit"], 1);
        assert_eq!(page["data"].as_array().unwrap().len(), 1);

        let response = server
            .get("/company/api/v1/customers?search=vikram")
            .authorization_bearer(&token)
            .await;
        let vikram = response.json::<Value>()["data"][0].clone();
        let path = format!("/company/api/v1/customers/{}", vikram["id"].as_str().unwrap());

        let response = server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({"email": "vikram@example.com"}))
            .await;
        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["email"], "vikram@example.com");
        assert_eq!(updated["phone"], "9800000002");

        server.delete(&path).authorization_bearer(&token).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&path).authorization_bearer(&token).await.assert_status(StatusCode::NOT_FOUND);

        state.registry.close_all().await;
        tenants.cleanup().await;
    }
}
