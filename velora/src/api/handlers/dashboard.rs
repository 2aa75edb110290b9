use axum::Json;
use chrono::Utc;

use crate::{api::models::dashboard::DashboardStatsResponse, auth::tenant::Tenant, db::handlers::Dashboard, errors::Error};

/// Headline figures for the company dashboard
///
/// Months are calendar months in UTC.
#[utoipa::path(
    get,
    path = "/company/api/v1/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStatsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(db_name = %tenant.db_name()))]
pub async fn get_stats(tenant: Tenant) -> Result<Json<DashboardStatsResponse>, Error> {
    let mut conn = tenant.pool().acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stats = Dashboard::new(&mut conn).stats(Utc::now()).await?;
    Ok(Json(stats.into()))
}

#[cfg(test)]
mod tests {
    use crate::db::handlers::{Customers, Items, Repository, Sales};
    use crate::db::models::sales::{SaleCreateDBRequest, SaleLineCreateDBRequest};
    use crate::test_utils::{
        TestTenants, company_token, create_test_admin, create_test_app, customer_request, insert_company_record, item_request,
    };
    use rust_decimal::Decimal;
    use serde_json::Value;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats_reflect_this_months_sales(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let db_name = tenants.provision().await;
        let company = insert_company_record(&pool, admin.id, &db_name).await;
        let (server, state) = create_test_app(pool).await;

        let handle = state.registry.get(&db_name).await.unwrap();
        let mut conn = handle.pool().acquire().await.unwrap();
        let item = Items::new(&mut conn).create(&item_request("ITM001", 100, 18)).await.unwrap();
        let customer = Customers::new(&mut conn)
            .create(&customer_request("Asha Rao", "9800000001"))
            .await
            .unwrap();
        Sales::new(&mut conn)
            .create(&SaleCreateDBRequest {
                customer_id: customer.id,
                lines: vec![SaleLineCreateDBRequest {
                    item_id: item.id,
                    quantity: 2,
                    discount: Decimal::ZERO,
                }],
            })
            .await
            .unwrap();
        drop(conn);

        let response = server
            .get("/company/api/v1/dashboard/stats")
            .authorization_bearer(company_token(&company))
            .await;
        response.assert_status_ok();
        let stats: Value = response.json();
        assert_eq!(stats["totalSales"], "236.00");
        assert_eq!(stats["currentMonthSales"], "236.00");
        assert_eq!(stats["totalCustomers"], 1);
        assert_eq!(stats["totalItems"], 1);
        assert_eq!(stats["monthlyGrowth"], "100");

        state.registry.close_all().await;
        tenants.cleanup().await;
    }
}
