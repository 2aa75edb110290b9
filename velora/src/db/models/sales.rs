//! Database models for sales and their lines.

use crate::types::{CustomerId, ItemId, SaleId, SaleLineId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// One line of a new sale, as entered.
#[derive(Debug, Clone)]
pub struct SaleLineCreateDBRequest {
    pub item_id: ItemId,
    pub quantity: i32,
    /// Discount percentage applied to this line
    pub discount: Decimal,
}

/// Database request for creating a sale. The total is computed from the lines and the items'
/// current rates; callers never supply it.
#[derive(Debug, Clone)]
pub struct SaleCreateDBRequest {
    pub customer_id: CustomerId,
    pub lines: Vec<SaleLineCreateDBRequest>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SaleLineDBResponse {
    pub id: SaleLineId,
    pub sale_id: SaleId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub discount: Decimal,
    pub position: i32,
}

/// A sale row without its lines.
#[derive(Debug, Clone, FromRow)]
pub struct SaleRow {
    pub id: SaleId,
    pub customer_id: CustomerId,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a sale, lines in entry order.
#[derive(Debug, Clone)]
pub struct SaleDBResponse {
    pub id: SaleId,
    pub customer_id: CustomerId,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<SaleLineDBResponse>,
}

impl SaleDBResponse {
    pub fn from_parts(row: SaleRow, lines: Vec<SaleLineDBResponse>) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            lines,
        }
    }
}
