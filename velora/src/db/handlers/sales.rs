//! Database repository for sales.
//!
//! A sale is written together with its lines in one transaction. Prices are never taken from
//! the caller: each line is priced from the item's current selling rate and tax percentage
//! through [`crate::billing`], and the stored `total_amount` is the rounded sum.
//!
//! Discounts are rounded to the column's two decimal places before pricing, so the stored total
//! always matches the stored lines.

use crate::billing::{LineInput, price_line, round_currency, sale_total};
use crate::db::{
    errors::{DbError, Result},
    models::{
        items::ItemDBResponse,
        sales::{SaleCreateDBRequest, SaleDBResponse, SaleLineDBResponse, SaleRow},
    },
};
use crate::types::{CustomerId, ItemId, SaleId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing sales, newest first
#[derive(Debug, Clone)]
pub struct SaleFilter {
    pub skip: i64,
    pub limit: i64,
    pub customer_id: Option<CustomerId>,
    /// Inclusive lower bound on `created_at`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            customer_id: None,
            from: None,
            to: None,
        }
    }

    pub fn for_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(customer_id) = self.customer_id {
            query.push(" AND customer_id = ");
            query.push_bind(customer_id);
        }
        if let Some(from) = self.from {
            query.push(" AND created_at >= ");
            query.push_bind(from);
        }
        if let Some(to) = self.to {
            query.push(" AND created_at < ");
            query.push_bind(to);
        }
    }
}

pub struct Sales<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sales<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Price and store a sale. An unknown item or customer is reported as a foreign key
    /// violation and nothing is written.
    #[instrument(skip(self, request), fields(customer_id = %abbrev_uuid(&request.customer_id), lines = request.lines.len()), err)]
    pub async fn create(&mut self, request: &SaleCreateDBRequest) -> Result<SaleDBResponse> {
        let mut tx = self.db.begin().await?;

        let item_ids: Vec<ItemId> = request.lines.iter().map(|line| line.item_id).collect();
        let items: HashMap<ItemId, ItemDBResponse> =
            sqlx::query_as::<_, ItemDBResponse>("SELECT * FROM items WHERE id = ANY($1)")
                .bind(item_ids.as_slice())
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|item| (item.id, item))
                .collect();

        let discounts: Vec<_> = request.lines.iter().map(|line| round_currency(line.discount)).collect();

        let mut priced = Vec::with_capacity(request.lines.len());
        for (line, discount) in request.lines.iter().zip(&discounts) {
            let item = items.get(&line.item_id).ok_or_else(|| DbError::ForeignKeyViolation {
                constraint: Some("sale_lines_item_id_fkey".to_string()),
                table: Some("sale_lines".to_string()),
                message: format!("item {} does not exist", line.item_id),
            })?;
            priced.push(price_line(&LineInput {
                quantity: line.quantity,
                selling_rate: item.selling_rate,
                discount_percent: *discount,
                tax_percent: item.tax,
            }));
        }
        let total = sale_total(&priced);

        let row = sqlx::query_as::<_, SaleRow>("INSERT INTO sales (customer_id, total_amount) VALUES ($1, $2) RETURNING *")
            .bind(request.customer_id)
            .bind(total)
            .fetch_one(&mut *tx)
            .await?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for (position, (line, discount)) in request.lines.iter().zip(&discounts).enumerate() {
            let stored = sqlx::query_as::<_, SaleLineDBResponse>(
                r#"
                INSERT INTO sale_lines (sale_id, item_id, quantity, discount, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(row.id)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(discount)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(stored);
        }

        tx.commit().await?;
        Ok(SaleDBResponse::from_parts(row, lines))
    }

    #[instrument(skip(self), fields(sale_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SaleId) -> Result<Option<SaleDBResponse>> {
        let Some(row) = sqlx::query_as::<_, SaleRow>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SaleLineDBResponse>("SELECT * FROM sale_lines WHERE sale_id = $1 ORDER BY position")
            .bind(id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(Some(SaleDBResponse::from_parts(row, lines)))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &SaleFilter) -> Result<Vec<SaleDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM sales WHERE 1=1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY created_at DESC, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let rows = query.build_query_as::<SaleRow>().fetch_all(&mut *self.db).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sale_ids: Vec<SaleId> = rows.iter().map(|row| row.id).collect();
        let mut lines_by_sale: HashMap<SaleId, Vec<SaleLineDBResponse>> = HashMap::new();
        let lines = sqlx::query_as::<_, SaleLineDBResponse>(
            "SELECT * FROM sale_lines WHERE sale_id = ANY($1) ORDER BY sale_id, position",
        )
        .bind(sale_ids.as_slice())
        .fetch_all(&mut *self.db)
        .await?;
        for line in lines {
            lines_by_sale.entry(line.sale_id).or_default().push(line);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = lines_by_sale.remove(&row.id).unwrap_or_default();
                SaleDBResponse::from_parts(row, lines)
            })
            .collect())
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &SaleFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM sales WHERE 1=1");
        filter.push_conditions(&mut query);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
