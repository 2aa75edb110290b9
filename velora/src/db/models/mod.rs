//! Database record models matching table schemas.
//!
//! These models are used by repositories to return query results and accept insertion/update
//! data. They are distinct from the API models in [`crate::api::models`] so that storage and
//! wire representations can evolve independently.
//!
//! # Model Categories
//!
//! ## Global database
//!
//! - [`admins`]: Admin panel operators
//! - [`companies`]: Tenant records, including each company's database name
//!
//! ## Tenant databases
//!
//! - [`items`]: The product master
//! - [`customers`]: Customers a company sells to
//! - [`masters`]: Categories, tax rates and units
//! - [`sales`]: Sales and sale lines

pub mod admins;
pub mod companies;
pub mod customers;
pub mod items;
pub mod masters;
pub mod sales;
