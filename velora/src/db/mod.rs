//! Database layer for data persistence and access.
//!
//! There are two kinds of database behind this module:
//!
//! ```text
//!            ┌──────────────────┐
//!            │  Global database │  admins, companies (sqlx migrations in migrations/)
//!            └────────┬─────────┘
//!                     │ companies.db_name
//!        ┌────────────┼────────────┐
//!        ↓            ↓            ↓
//!   ┌─────────┐  ┌─────────┐  ┌─────────┐
//!   │ tenant  │  │ tenant  │  │ tenant  │  items, customers, sales, ...
//!   └─────────┘  └─────────┘  └─────────┘  (versioned by crate::tenancy::migrations)
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Writes that touch more than one row are made from a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Companies::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! Read-only handlers acquire a plain connection instead.

pub mod errors;
pub mod handlers;
pub mod models;
