//! Database models for admins.

use crate::types::AdminId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new admin
#[derive(Debug, Clone)]
pub struct AdminCreateDBRequest {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
}

/// Database response for an admin
#[derive(Debug, Clone, FromRow)]
pub struct AdminDBResponse {
    pub id: AdminId,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
