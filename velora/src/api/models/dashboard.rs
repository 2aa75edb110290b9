use crate::db::handlers::dashboard::DashboardStats;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    #[schema(value_type = String)]
    pub total_sales: Decimal,
    pub total_customers: i64,
    pub total_items: i64,
    #[schema(value_type = String)]
    pub current_month_sales: Decimal,
    #[schema(value_type = String)]
    pub previous_month_sales: Decimal,
    /// Percent change from last calendar month, two decimal places
    #[schema(value_type = String, example = "12.50")]
    pub monthly_growth: Decimal,
}

impl From<DashboardStats> for DashboardStatsResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_sales: stats.total_sales,
            total_customers: stats.total_customers,
            total_items: stats.total_items,
            current_month_sales: stats.current_month_sales,
            previous_month_sales: stats.previous_month_sales,
            monthly_growth: stats.monthly_growth,
        }
    }
}
