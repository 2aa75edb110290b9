//! API request and response data models.
//!
//! These structures define the public JSON contract (camelCase field names). They are kept
//! apart from the database models in [`crate::db::models`] so that storage and wire
//! representations can evolve independently. Every model derives `utoipa::ToSchema` for the
//! OpenAPI document.
//!
//! Money and percentages are `rust_decimal::Decimal` and travel as strings.
//!
//! # Model Categories
//!
//! ## Admin surface
//!
//! - [`auth`]: Login and registration payloads (both surfaces)
//! - [`companies`]: Company records and their create/update requests
//!
//! ## Company surface
//!
//! - [`items`], [`customers`], [`masters`]: Master data
//! - [`sales`]: Sales entry and the sales report
//! - [`dashboard`]: Dashboard figures
//!
//! ## Shared
//!
//! - [`pagination`]: `skip`/`limit` query parameters and the paginated envelope

pub mod auth;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod items;
pub mod masters;
pub mod pagination;
pub mod sales;
