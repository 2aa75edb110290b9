//! Database models for items (the product master).

use crate::types::{CategoryId, ItemId, TaxRateId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database request for creating a new item
#[derive(Debug, Clone)]
pub struct ItemCreateDBRequest {
    pub item_code: String,
    pub item_name: String,
    /// Display tax percentage. Overwritten with the linked rate when `tax_id` is set.
    pub tax: Decimal,
    pub purchase_rate: Decimal,
    pub selling_rate: Decimal,
    pub mrp: Decimal,
    pub category_id: Option<CategoryId>,
    pub tax_id: Option<TaxRateId>,
    pub unit_id: Option<UnitId>,
    pub image_url: Option<String>,
}

/// Database request for updating an item.
///
/// `None` leaves a field unchanged. For the links, `Some(None)` clears the link.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdateDBRequest {
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    pub tax: Option<Decimal>,
    pub purchase_rate: Option<Decimal>,
    pub selling_rate: Option<Decimal>,
    pub mrp: Option<Decimal>,
    pub category_id: Option<Option<CategoryId>>,
    pub tax_id: Option<Option<TaxRateId>>,
    pub unit_id: Option<Option<UnitId>>,
    pub image_url: Option<String>,
}

/// Database response for an item
#[derive(Debug, Clone, FromRow)]
pub struct ItemDBResponse {
    pub id: ItemId,
    pub item_code: String,
    pub item_name: String,
    pub tax: Decimal,
    pub purchase_rate: Decimal,
    pub selling_rate: Decimal,
    pub mrp: Decimal,
    pub category_id: Option<CategoryId>,
    pub tax_id: Option<TaxRateId>,
    pub unit_id: Option<UnitId>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
