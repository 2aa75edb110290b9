//! API models for sales entry and the sales report.

use super::customers::CustomerResponse;
use super::items::ItemResponse;
use super::pagination::Pagination;
use crate::db::handlers::sales::SaleFilter;
use crate::db::models::{
    customers::CustomerDBResponse,
    items::ItemDBResponse,
    sales::{SaleCreateDBRequest, SaleDBResponse, SaleLineCreateDBRequest, SaleLineDBResponse},
};
use crate::types::{CustomerId, ItemId, SaleId, SaleLineId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineCreate {
    #[schema(value_type = String, format = "uuid")]
    pub item_id: ItemId,
    #[schema(example = 2)]
    pub quantity: i32,
    /// Discount percentage for this line (default 0)
    #[serde(default)]
    #[schema(value_type = String, example = "0")]
    pub discount: Decimal,
}

/// A new sale. There is no total field: the server prices every line from the item master.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreate {
    #[schema(value_type = String, format = "uuid")]
    pub customer_id: CustomerId,
    pub lines: Vec<SaleLineCreate>,
}

impl From<SaleCreate> for SaleCreateDBRequest {
    fn from(api: SaleCreate) -> Self {
        Self {
            customer_id: api.customer_id,
            lines: api
                .lines
                .into_iter()
                .map(|line| SaleLineCreateDBRequest {
                    item_id: line.item_id,
                    quantity: line.quantity,
                    discount: line.discount,
                })
                .collect(),
        }
    }
}

/// Query parameters for the sales report
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListSalesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only sales to this customer
    #[param(value_type = Option<String>, format = "uuid")]
    pub customer_id: Option<CustomerId>,

    /// Only sales at or after this time
    #[param(value_type = Option<String>, format = "date-time")]
    pub from: Option<DateTime<Utc>>,

    /// Only sales before this time
    #[param(value_type = Option<String>, format = "date-time")]
    pub to: Option<DateTime<Utc>>,
}

impl ListSalesQuery {
    pub fn filter(&self) -> SaleFilter {
        let (skip, limit) = self.pagination.params();
        let filter = SaleFilter::new(skip, limit).between(self.from, self.to);
        match self.customer_id {
            Some(customer_id) => filter.for_customer(customer_id),
            None => filter,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SaleLineId,
    #[schema(value_type = String, format = "uuid")]
    pub item_id: ItemId,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub discount: Decimal,
    pub position: i32,
    /// The item as it is now
    pub item: Option<ItemResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SaleId,
    #[schema(value_type = String, format = "uuid")]
    pub customer_id: CustomerId,
    #[schema(value_type = String, example = "236.00")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer: Option<CustomerResponse>,
    pub lines: Vec<SaleLineResponse>,
}

impl SaleResponse {
    /// Attach the customer and items from bulk lookups.
    pub fn resolve(
        sale: SaleDBResponse,
        customers: &HashMap<CustomerId, CustomerDBResponse>,
        items: &HashMap<ItemId, ItemDBResponse>,
    ) -> Self {
        let line = |line: SaleLineDBResponse| SaleLineResponse {
            id: line.id,
            item_id: line.item_id,
            quantity: line.quantity,
            discount: line.discount,
            position: line.position,
            item: items.get(&line.item_id).cloned().map(ItemResponse::from),
        };

        Self {
            id: sale.id,
            customer_id: sale.customer_id,
            total_amount: sale.total_amount,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
            customer: customers.get(&sale.customer_id).cloned().map(CustomerResponse::from),
            lines: sale.lines.into_iter().map(line).collect(),
        }
    }
}
