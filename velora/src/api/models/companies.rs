//! API request/response models for companies.

use crate::db::models::companies::{CompanyDBResponse, CompanyProfile};
use crate::types::{AdminId, CompanyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Contact and address fields accepted on create and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfileFields {
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
    pub logo: Option<String>,
    #[schema(example = "12 MG Road")]
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pin_code: Option<String>,
    pub gst_number: Option<String>,
}

impl From<CompanyProfileFields> for CompanyProfile {
    fn from(fields: CompanyProfileFields) -> Self {
        Self {
            phone: fields.phone,
            logo: fields.logo,
            address: fields.address,
            city: fields.city,
            state: fields.state,
            country: fields.country,
            pin_code: fields.pin_code,
            gst_number: fields.gst_number,
        }
    }
}

/// Request body for creating a company. The tenant database name is generated by the server.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCreate {
    #[schema(example = "owner@acme.example")]
    pub email: String,
    #[schema(example = "Acme Traders")]
    pub name: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: CompanyProfileFields,
    /// Defaults to true
    pub is_active: Option<bool>,
    /// Defaults to `["new-sales"]`
    pub allowed_transactions: Option<Vec<String>>,
}

/// Request body for updating a company. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    /// New password, hashed before storing
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: CompanyProfileFields,
    pub is_active: Option<bool>,
    pub allowed_transactions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CompanyId,
    #[schema(value_type = String, format = "uuid")]
    pub admin_id: AdminId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pin_code: Option<String>,
    pub gst_number: Option<String>,
    pub is_active: bool,
    /// Name of the company's tenant database
    pub db_name: String,
    pub allowed_transactions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyDBResponse> for CompanyResponse {
    fn from(db: CompanyDBResponse) -> Self {
        Self {
            id: db.id,
            admin_id: db.admin_id,
            email: db.email,
            name: db.name,
            phone: db.phone,
            logo: db.logo,
            address: db.address,
            city: db.city,
            state: db.state,
            country: db.country,
            pin_code: db.pin_code,
            gst_number: db.gst_number,
            is_active: db.is_active,
            db_name: db.db_name.to_string(),
            allowed_transactions: db.allowed_transactions,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
