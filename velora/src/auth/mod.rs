//! Authentication for the admin and company surfaces.
//!
//! Both surfaces use bearer session tokens (HS256 JWTs signed with `secret_key`) issued by their
//! respective login endpoints:
//!
//! - **Admin sessions** authorise `/admin/api/v1/...` and are extracted with
//!   [`current_user::CurrentAdmin`].
//! - **Company sessions** authorise `/company/api/v1/...`. They carry the company's tenant
//!   database name, and are extracted with [`tenant::Tenant`], which also resolves the tenant's
//!   connection handle.
//!
//! # Modules
//!
//! - [`current_user`]: Admin session extractor
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Token creation and verification
//! - [`tenant`]: Company session extractor and tenant resolver
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use velora::auth::tenant::Tenant;
//!
//! async fn list_items(tenant: Tenant) -> Result<Json<Vec<ItemResponse>>, Error> {
//!     let mut conn = tenant.pool().acquire().await?;
//!     // ...
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
pub mod tenant;
