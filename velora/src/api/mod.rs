//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Admin surface, authenticated with an admin session token:
//!
//! - **Authentication** (`/admin/api/v1/authentication/*`): admin login and registration
//! - **Companies** (`/admin/api/v1/companies/*`): company records; creating one provisions its database
//! - **Tenants** (`/admin/api/v1/tenants/migrate`): bring every company database up to date
//!
//! Company surface, authenticated with a company session token and routed to that company's
//! database:
//!
//! - **Authentication** (`/company/api/v1/authentication/login`)
//! - **Masters** (`/company/api/v1/{items,customers,categories,taxes,units}/*`)
//! - **Sales** (`/company/api/v1/sales/*`): sales entry, the sales report and text invoices
//! - **Dashboard** (`/company/api/v1/dashboard/stats`)
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The document is served at
//! `/api-docs/openapi.json` and browsable at `/docs`.

pub mod handlers;
pub mod models;
