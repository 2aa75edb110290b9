//! Login and registration payloads for both surfaces.

use crate::db::models::{admins::AdminDBResponse, companies::CompanyDBResponse};
use crate::types::{AdminId, CompanyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Email and password, for either admin or company login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "owner@acme.example")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "Admin Name")]
    pub name: String,
    pub password: String,
    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AdminId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AdminDBResponse> for AdminResponse {
    fn from(db: AdminDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.name,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    /// Bearer token for `/admin/api/v1/...`
    pub access_token: String,
    pub admin: AdminResponse,
}

/// The company fields returned on login.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: CompanyId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    /// Transaction screens enabled for this company
    pub allowed_transactions: Vec<String>,
}

impl From<&CompanyDBResponse> for CompanySummary {
    fn from(db: &CompanyDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            name: db.name.clone(),
            is_active: db.is_active,
            allowed_transactions: db.allowed_transactions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLoginResponse {
    /// Bearer token for `/company/api/v1/...`
    pub access_token: String,
    pub company: CompanySummary,
}
