//! Aggregate figures for the company dashboard.

use crate::billing::round_currency;
use crate::db::errors::Result;
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Sum of every sale's total
    pub total_sales: Decimal,
    pub total_customers: i64,
    pub total_items: i64,
    pub current_month_sales: Decimal,
    pub previous_month_sales: Decimal,
    /// Percentage change from the previous calendar month to the current one
    pub monthly_growth: Decimal,
}

#[derive(Debug, FromRow)]
struct Totals {
    total_sales: Decimal,
    total_customers: i64,
    total_items: i64,
    current_month_sales: Decimal,
    previous_month_sales: Decimal,
}

/// Start of the previous month, start of `now`'s month, and start of the next month, in UTC.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .unwrap_or(now.date_naive())
        .and_time(chrono::NaiveTime::MIN);
    let current = Utc.from_utc_datetime(&first);
    let previous = current.checked_sub_months(Months::new(1)).unwrap_or(current);
    let next = current.checked_add_months(Months::new(1)).unwrap_or(current);
    (previous, current, next)
}

/// Month-over-month growth in percent, rounded to two places. With no sales last month the
/// growth is 100 if anything sold this month and 0 otherwise.
pub fn monthly_growth(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        round_currency((current - previous) / previous * Decimal::ONE_HUNDRED)
    } else if current > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

pub struct Dashboard<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Dashboard<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let (previous, current, next) = month_bounds(now);

        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                COALESCE((SELECT SUM(total_amount) FROM sales), 0) AS total_sales,
                (SELECT COUNT(*) FROM customers) AS total_customers,
                (SELECT COUNT(*) FROM items) AS total_items,
                COALESCE((SELECT SUM(total_amount) FROM sales
                          WHERE created_at >= $2 AND created_at < $3), 0) AS current_month_sales,
                COALESCE((SELECT SUM(total_amount) FROM sales
                          WHERE created_at >= $1 AND created_at < $2), 0) AS previous_month_sales
            "#,
        )
        .bind(previous)
        .bind(current)
        .bind(next)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(DashboardStats {
            total_sales: totals.total_sales,
            total_customers: totals.total_customers,
            total_items: totals.total_items,
            current_month_sales: totals.current_month_sales,
            previous_month_sales: totals.previous_month_sales,
            monthly_growth: monthly_growth(totals.current_month_sales, totals.previous_month_sales),
        })
    }
}
