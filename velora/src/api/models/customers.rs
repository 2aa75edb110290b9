use crate::db::models::customers::{CustomerCreateDBRequest, CustomerDBResponse, CustomerUpdateDBRequest};
use crate::types::CustomerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CustomerCreate {
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "9800000001")]
    pub phone: String,
    pub email: Option<String>,
}

impl From<CustomerCreate> for CustomerCreateDBRequest {
    fn from(api: CustomerCreate) -> Self {
        Self {
            name: api.name,
            phone: api.phone,
            email: api.email,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<CustomerUpdate> for CustomerUpdateDBRequest {
    fn from(api: CustomerUpdate) -> Self {
        Self {
            name: api.name,
            phone: api.phone,
            email: api.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerDBResponse> for CustomerResponse {
    fn from(db: CustomerDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            phone: db.phone,
            email: db.email,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
