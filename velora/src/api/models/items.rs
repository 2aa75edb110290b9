//! API request/response models for the item master.

use crate::db::models::items::{ItemCreateDBRequest, ItemDBResponse, ItemUpdateDBRequest};
use crate::types::{CategoryId, ItemId, TaxRateId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemCreate {
    #[schema(example = "ITM001")]
    pub item_code: String,
    #[schema(example = "Toothpaste")]
    pub item_name: String,
    /// Tax percentage. Replaced by the linked rate when `taxId` is given.
    #[serde(default)]
    #[schema(value_type = String, example = "18")]
    pub tax: Decimal,
    #[serde(default)]
    #[schema(value_type = String, example = "50")]
    pub purchase_rate: Decimal,
    #[schema(value_type = String, example = "100")]
    pub selling_rate: Decimal,
    #[schema(value_type = String, example = "110")]
    pub mrp: Decimal,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tax_id: Option<TaxRateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub unit_id: Option<UnitId>,
    pub image_url: Option<String>,
}

impl From<ItemCreate> for ItemCreateDBRequest {
    fn from(api: ItemCreate) -> Self {
        Self {
            item_code: api.item_code,
            item_name: api.item_name,
            tax: api.tax,
            purchase_rate: api.purchase_rate,
            selling_rate: api.selling_rate,
            mrp: api.mrp,
            category_id: api.category_id,
            tax_id: api.tax_id,
            unit_id: api.unit_id,
            image_url: api.image_url,
        }
    }
}

/// Omitted fields are left unchanged. An explicit `null` for `categoryId`, `taxId` or `unitId`
/// unlinks the item; its stored tax percentage is kept.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub tax: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub purchase_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub selling_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub mrp: Option<Decimal>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tax_id: Option<Option<TaxRateId>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub unit_id: Option<Option<UnitId>>,
    pub image_url: Option<String>,
}

impl From<ItemUpdate> for ItemUpdateDBRequest {
    fn from(api: ItemUpdate) -> Self {
        Self {
            item_code: api.item_code,
            item_name: api.item_name,
            tax: api.tax,
            purchase_rate: api.purchase_rate,
            selling_rate: api.selling_rate,
            mrp: api.mrp,
            category_id: api.category_id,
            tax_id: api.tax_id,
            unit_id: api.unit_id,
            image_url: api.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ItemId,
    pub item_code: String,
    pub item_name: String,
    #[schema(value_type = String)]
    pub tax: Decimal,
    #[schema(value_type = String)]
    pub purchase_rate: Decimal,
    #[schema(value_type = String)]
    pub selling_rate: Decimal,
    #[schema(value_type = String)]
    pub mrp: Decimal,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub category_id: Option<CategoryId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tax_id: Option<TaxRateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub unit_id: Option<UnitId>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemDBResponse> for ItemResponse {
    fn from(db: ItemDBResponse) -> Self {
        Self {
            id: db.id,
            item_code: db.item_code,
            item_name: db.item_name,
            tax: db.tax,
            purchase_rate: db.purchase_rate,
            selling_rate: db.selling_rate,
            mrp: db.mrp,
            category_id: db.category_id,
            tax_id: db.tax_id,
            unit_id: db.unit_id,
            image_url: db.image_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
