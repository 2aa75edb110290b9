//! Repository implementations for database access.
//!
//! Each repository borrows a `PgConnection` and knows nothing about which database it points
//! at. The global repositories ([`Admins`], [`Companies`]) are handed a connection from the
//! global pool; the tenant repositories are handed one from the tenant pool that the request's
//! [`crate::auth::tenant::Tenant`] resolved.
//!
//! # Available Repositories
//!
//! Global database:
//!
//! - [`Admins`]: Admin accounts
//! - [`Companies`]: Tenant records
//!
//! Tenant databases:
//!
//! - [`Items`], [`Customers`], [`Categories`], [`TaxRates`], [`Units`]: Master data
//! - [`Sales`]: Sales entry and reporting, priced on the server
//! - [`Dashboard`]: Aggregate figures
//!
//! # Common Pattern
//!
//! ```ignore
//! use velora::db::handlers::{Items, Repository};
//!
//! async fn example(tenant: &velora::tenancy::TenantConnection) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = tenant.pool().begin().await?;
//!     let mut repo = Items::new(&mut tx);
//!     let item = repo.create(&create_request).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod admins;
pub mod categories;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod items;
pub mod repository;
pub mod sales;
pub mod tax_rates;
pub mod units;

pub use admins::Admins;
pub use categories::Categories;
pub use companies::Companies;
pub use customers::Customers;
pub use dashboard::Dashboard;
pub use items::Items;
pub use repository::{ListFilter, Repository};
pub use sales::Sales;
pub use tax_rates::TaxRates;
pub use units::Units;
