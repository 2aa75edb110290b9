//! Database models for companies (tenant records).

use crate::tenancy::TenantDbName;
use crate::types::{AdminId, CompanyId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Transaction screens a company gets when nothing else is specified.
pub const DEFAULT_ALLOWED_TRANSACTIONS: &[&str] = &["new-sales"];

/// Contact and address details shared by create and update requests.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pin_code: Option<String>,
    pub gst_number: Option<String>,
}

/// Database request for creating a new company
#[derive(Debug, Clone)]
pub struct CompanyCreateDBRequest {
    pub admin_id: AdminId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub profile: CompanyProfile,
    pub db_name: TenantDbName,
    pub allowed_transactions: Vec<String>,
}

/// Database request for updating a company. `None` leaves a field unchanged; the tenant
/// database name can never be updated.
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdateDBRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub profile: CompanyProfile,
    pub is_active: Option<bool>,
    pub allowed_transactions: Option<Vec<String>>,
}

/// Database response for a company
#[derive(Debug, Clone, FromRow)]
pub struct CompanyDBResponse {
    pub id: CompanyId,
    pub admin_id: AdminId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pin_code: Option<String>,
    pub gst_number: Option<String>,
    pub is_active: bool,
    #[sqlx(try_from = "String")]
    pub db_name: TenantDbName,
    pub allowed_transactions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
