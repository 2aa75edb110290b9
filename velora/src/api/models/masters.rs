//! API models for categories, tax rates and units.

use crate::db::models::masters::{
    CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest, TaxRateCreateDBRequest, TaxRateDBResponse,
    TaxRateUpdateDBRequest, UnitCreateDBRequest, UnitDBResponse, UnitUpdateDBRequest,
};
use crate::types::{CategoryId, TaxRateId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreate {
    #[schema(example = "Personal care")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CategoryUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryCreate> for CategoryCreateDBRequest {
    fn from(api: CategoryCreate) -> Self {
        Self { name: api.name }
    }
}

impl From<CategoryUpdate> for CategoryUpdateDBRequest {
    fn from(api: CategoryUpdate) -> Self {
        Self { name: api.name }
    }
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(db: CategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaxRateCreate {
    /// Percentage, e.g. `18` for 18%
    #[schema(value_type = String, example = "18")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaxRateUpdate {
    #[schema(value_type = Option<String>)]
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TaxRateId,
    #[schema(value_type = String)]
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaxRateCreate> for TaxRateCreateDBRequest {
    fn from(api: TaxRateCreate) -> Self {
        Self { rate: api.rate }
    }
}

impl From<TaxRateUpdate> for TaxRateUpdateDBRequest {
    fn from(api: TaxRateUpdate) -> Self {
        Self { rate: api.rate }
    }
}

impl From<TaxRateDBResponse> for TaxRateResponse {
    fn from(db: TaxRateDBResponse) -> Self {
        Self {
            id: db.id,
            rate: db.rate,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UnitCreate {
    #[schema(example = "kg")]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UnitUpdate {
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UnitId,
    pub symbol: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UnitCreate> for UnitCreateDBRequest {
    fn from(api: UnitCreate) -> Self {
        Self { symbol: api.symbol }
    }
}

impl From<UnitUpdate> for UnitUpdateDBRequest {
    fn from(api: UnitUpdate) -> Self {
        Self { symbol: api.symbol }
    }
}

impl From<UnitDBResponse> for UnitResponse {
    fn from(db: UnitDBResponse) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
