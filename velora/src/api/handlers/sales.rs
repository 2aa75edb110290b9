//! Sales entry, the sales report and invoices.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::missing,
        models::{
            pagination::PaginatedResponse,
            sales::{ListSalesQuery, SaleCreate, SaleResponse},
        },
    },
    auth::tenant::Tenant,
    db::{
        handlers::{Companies, Customers, Items, Repository, Sales},
        models::{customers::CustomerDBResponse, items::ItemDBResponse, sales::SaleDBResponse},
    },
    errors::Error,
    invoice::{Invoice, InvoiceHeader, InvoiceLine, render_invoice},
    types::{CustomerId, ItemId, SaleId},
};

type Related = (HashMap<CustomerId, CustomerDBResponse>, HashMap<ItemId, ItemDBResponse>);

/// Bulk-load the customers and items the given sales refer to.
async fn load_related(conn: &mut PgConnection, sales: &[SaleDBResponse]) -> Result<Related, Error> {
    let mut customer_ids: Vec<CustomerId> = sales.iter().map(|s| s.customer_id).collect();
    customer_ids.sort_unstable();
    customer_ids.dedup();
    let mut item_ids: Vec<ItemId> = sales.iter().flat_map(|s| s.lines.iter().map(|l| l.item_id)).collect();
    item_ids.sort_unstable();
    item_ids.dedup();

    let customers = Customers::new(&mut *conn).get_bulk(customer_ids).await?;
    let items = Items::new(&mut *conn).get_bulk(item_ids).await?;
    Ok((customers, items))
}

/// Reject lines the sale_lines columns cannot hold as given.
fn validate_lines(request: &SaleCreate) -> Result<(), Error> {
    let bad = |message: String| Err(Error::BadRequest { message });

    if request.lines.is_empty() {
        return bad("A sale needs at least one line".to_string());
    }
    for (index, line) in request.lines.iter().enumerate() {
        let n = index + 1;
        if line.quantity <= 0 {
            return bad(format!("Line {n}: quantity must be at least 1"));
        }
        if line.discount < Decimal::ZERO || line.discount > Decimal::ONE_HUNDRED {
            return bad(format!("Line {n}: discount must be between 0 and 100"));
        }
        if line.discount.normalize().scale() > 2 {
            return bad(format!("Line {n}: discount allows at most two decimal places"));
        }
    }
    Ok(())
}

/// Record a sale
///
/// Lines are priced from the item master; the client never supplies amounts.
#[utoipa::path(
    post,
    path = "/company/api/v1/sales",
    tag = "sales",
    request_body = SaleCreate,
    responses(
        (status = 201, description = "Sale recorded", body = SaleResponse),
        (status = 400, description = "No lines, a bad quantity or discount, or an unknown customer or item"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn create_sale(tenant: Tenant, Json(request): Json<SaleCreate>) -> Result<(StatusCode, Json<SaleResponse>), Error> {
    validate_lines(&request)?;

    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let sale = Sales::new(&mut conn).create(&request.into()).await?;
    info!(sale_id = %sale.id, total = %sale.total_amount, "Recorded sale");

    let (customers, items) = load_related(&mut conn, std::slice::from_ref(&sale)).await?;
    Ok((StatusCode::CREATED, Json(SaleResponse::resolve(sale, &customers, &items))))
}

/// Sales report
///
/// Newest first, optionally narrowed to one customer or a time window.
#[utoipa::path(
    get,
    path = "/company/api/v1/sales",
    tag = "sales",
    params(ListSalesQuery),
    responses(
        (status = 200, description = "Page of sales", body = PaginatedResponse<SaleResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn list_sales(Query(query): Query<ListSalesQuery>, tenant: Tenant) -> Result<Json<PaginatedResponse<SaleResponse>>, Error> {
    let filter = query.filter();
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Sales::new(&mut conn);
    let sales = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let (customers, items) = load_related(&mut conn, &sales).await?;
    let data = sales
        .into_iter()
        .map(|sale| SaleResponse::resolve(sale, &customers, &items))
        .collect();
    Ok(Json(PaginatedResponse::new(data, total_count, filter.skip, filter.limit)))
}

#[utoipa::path(
    get,
    path = "/company/api/v1/sales/{id}",
    tag = "sales",
    params(("id" = uuid::Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale with its lines", body = SaleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Sale not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(sale_id = %id))]
pub async fn get_sale(Path(id): Path<SaleId>, tenant: Tenant) -> Result<Json<SaleResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let sale = Sales::new(&mut conn).get_by_id(id).await?.ok_or_else(|| missing("Sale", id))?;

    let (customers, items) = load_related(&mut conn, std::slice::from_ref(&sale)).await?;
    Ok(Json(SaleResponse::resolve(sale, &customers, &items)))
}

/// Render a sale as a plain-text receipt
///
/// The store block comes from the company record; missing parts fall back to defaults.
#[utoipa::path(
    get,
    path = "/company/api/v1/sales/{id}/invoice",
    tag = "sales",
    params(("id" = uuid::Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Rendered invoice", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Sale not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(sale_id = %id))]
pub async fn get_invoice(State(state): State<AppState>, Path(id): Path<SaleId>, tenant: Tenant) -> Result<impl IntoResponse, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let sale = Sales::new(&mut conn).get_by_id(id).await?.ok_or_else(|| missing("Sale", id))?;
    let (customers, items) = load_related(&mut conn, std::slice::from_ref(&sale)).await?;

    let store = {
        let mut global = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        match Companies::new(&mut global).get_by_id(tenant.company_id).await? {
            Some(company) => InvoiceHeader::for_company(&company),
            None => InvoiceHeader::default(),
        }
    };

    let customer = customers.get(&sale.customer_id);
    let invoice = Invoice {
        sale_id: sale.id,
        created_at: sale.created_at,
        customer_name: customer.map(|c| c.name.clone()).unwrap_or_default(),
        customer_phone: customer.map(|c| c.phone.clone()).unwrap_or_default(),
        lines: sale
            .lines
            .iter()
            .map(|line| {
                let item = items.get(&line.item_id);
                InvoiceLine {
                    item_name: item.map(|i| i.item_name.clone()).unwrap_or_default(),
                    quantity: line.quantity,
                    selling_rate: item.map(|i| i.selling_rate).unwrap_or_default(),
                }
            })
            .collect(),
        total: sale.total_amount,
    };

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], render_invoice(&store, &invoice)))
}

#[cfg(test)]
mod tests {
    use crate::db::handlers::{Customers, Items, Repository};
    use crate::test_utils::{
        TestTenants, company_token, create_test_admin, create_test_app, customer_request, insert_company_record, item_request,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_sales_are_isolated_between_companies(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let acme_1 = insert_company_record(&pool, admin.id, &tenants.provision().await).await;
        let acme_2 = insert_company_record(&pool, admin.id, &tenants.provision().await).await;
        let (server, state) = create_test_app(pool).await;
        let token_1 = company_token(&acme_1);

        let response = server
            .post("/company/api/v1/items")
            .authorization_bearer(&token_1)
            .json(&json!({"itemCode": "ITM001", "itemName": "Toothpaste", "tax": "18", "sellingRate": "100", "mrp": "110"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let item_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let response = server
            .post("/company/api/v1/customers")
            .authorization_bearer(&token_1)
            .json(&json!({"name": "Asha Rao", "phone": "9800000001"}))
            .await;
        let customer_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let response = server
            .post("/company/api/v1/sales")
            .authorization_bearer(&token_1)
            .json(&json!({"customerId": customer_id, "lines": [{"itemId": item_id, "quantity": 2}]}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let sale: Value = response.json();
        assert_eq!(sale["totalAmount"], "236.00");
        assert_eq!(sale["customer"]["name"], "Asha Rao");
        assert_eq!(sale["lines"][0]["item"]["itemCode"], "ITM001");

        let report: Value = server.get("/company/api/v1/sales").authorization_bearer(&token_1).await.json();
        assert_eq!(report["totalCount"], 1);
        assert_eq!(report["data"][0]["totalAmount"], "236.00");

        let report: Value = server
            .get("/company/api/v1/sales")
            .authorization_bearer(company_token(&acme_2))
            .await
            .json();
        assert_eq!(report["totalCount"], 0);
        assert_eq!(report["data"], json!([]));

        state.registry.close_all().await;
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invoice_uses_company_header(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let db_name = tenants.provision().await;
        let company = insert_company_record(&pool, admin.id, &db_name).await;
        sqlx::query("UPDATE companies SET phone = '9123456780', city = 'Pune' WHERE id = $1")
            .bind(company.id)
            .execute(&pool)
            .await
            .unwrap();
        let (server, state) = create_test_app(pool).await;
        let token = company_token(&company);

        let handle = state.registry.get(&db_name).await.unwrap();
        let mut conn = handle.pool().acquire().await.unwrap();
        let item = Items::new(&mut conn).create(&item_request("ITM001", 100, 18)).await.unwrap();
        let customer = Customers::new(&mut conn)
            .create(&customer_request("Asha Rao", "9800000001"))
            .await
            .unwrap();
        drop(conn);

        let sale: Value = server
            .post("/company/api/v1/sales")
            .authorization_bearer(&token)
            .json(&json!({"customerId": customer.id, "lines": [{"itemId": item.id, "quantity": 2}]}))
            .await
            .json();

        let response = server
            .get(&format!("/company/api/v1/sales/{}/invoice", sale["id"].as_str().unwrap()))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert!(
            response
                .header("content-type")
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        let text = response.text();
        assert!(text.contains(&company.name.to_uppercase()), "{text}");
        assert!(text.contains("Phone: 9123456780"), "{text}");
        assert!(text.contains("Asha Rao"), "{text}");
        assert!(text.contains("TOTAL: Rs 236.00"), "{text}");

        state.registry.close_all().await;
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rejected_sales(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let company = insert_company_record(&pool, admin.id, &tenants.provision().await).await;
        let (server, state) = create_test_app(pool).await;
        let token = company_token(&company);

        let response = server
            .post("/company/api/v1/sales")
            .authorization_bearer(&token)
            .json(&json!({"customerId": uuid::Uuid::new_v4(), "lines": []}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/company/api/v1/sales")
            .authorization_bearer(&token)
            .json(&json!({"customerId": uuid::Uuid::new_v4(), "lines": [{"itemId": uuid::Uuid::new_v4(), "quantity": 1}]}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        server
            .get(&format!("/company/api/v1/sales/{}", uuid::Uuid::new_v4()))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        state.registry.close_all().await;
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_malformed_lines_are_rejected(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let company = insert_company_record(&pool, admin.id, &tenants.provision().await).await;
        let (server, state) = create_test_app(pool).await;
        let token = company_token(&company);

        let item: Value = server
            .post("/company/api/v1/items")
            .authorization_bearer(&token)
            .json(&json!({"itemCode": "ITM001", "itemName": "Toothpaste", "sellingRate": "1000", "mrp": "1100"}))
            .await
            .json();
        let customer: Value = server
            .post("/company/api/v1/customers")
            .authorization_bearer(&token)
            .json(&json!({"name": "Asha Rao", "phone": "9800000001"}))
            .await
            .json();

        for (quantity, discount) in [(0, "0"), (-1, "0"), (1, "-5"), (1, "150"), (1, "1000"), (1, "0.005")] {
            let response = server
                .post("/company/api/v1/sales")
                .authorization_bearer(&token)
                .json(&json!({
                    "customerId": customer["id"],
                    "lines": [{"itemId": item["id"], "quantity": quantity, "discount": discount}]
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }

        let page: Value = server.get("/company/api/v1/sales").authorization_bearer(&token).await.json();
        assert_eq!(page["totalCount"], 0);

        let response = server
            .post("/company/api/v1/sales")
            .authorization_bearer(&token)
            .json(&json!({
                "customerId": customer["id"],
                "lines": [{"itemId": item["id"], "quantity": 1, "discount": "12.50"}]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["totalAmount"], "875.00");

        state.registry.close_all().await;
        tenants.cleanup().await;
    }
}
