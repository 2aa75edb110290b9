//! Database models for the small lookup masters: categories, tax rates and units.

use crate::types::{CategoryId, TaxRateId, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdateDBRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TaxRateCreateDBRequest {
    /// Percentage, e.g. `18` for 18%
    pub rate: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct TaxRateUpdateDBRequest {
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaxRateDBResponse {
    pub id: TaxRateId,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UnitCreateDBRequest {
    pub symbol: String,
}

#[derive(Debug, Clone, Default)]
pub struct UnitUpdateDBRequest {
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UnitDBResponse {
    pub id: UnitId,
    pub symbol: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
