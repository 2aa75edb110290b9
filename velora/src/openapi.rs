//! OpenAPI documentation for both API surfaces.
//!
//! The document is served at `/api-docs/openapi.json` with a Scalar UI at `/docs`. Paths are
//! absolute, so admin (`/admin/api/v1/*`) and company (`/company/api/v1/*`) endpoints share one
//! document and are told apart by tag.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;
use crate::tenancy::migrations;

/// Bearer session token, as issued by either login endpoint.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from `POST /admin/api/v1/authentication/login` (admin endpoints) or \
                            `POST /company/api/v1/authentication/login` (company endpoints).",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Velora API",
        description = "Multi-tenant billing and inventory. Each company's data lives in its own database; \
        company endpoints are routed to it by the session token."
    ),
    modifiers(&SecurityAddon),
    paths(
        // Admin surface
        api::handlers::auth::admin_login,
        api::handlers::auth::admin_register,
        api::handlers::companies::list_companies,
        api::handlers::companies::create_company,
        api::handlers::companies::update_company,
        api::handlers::companies::delete_company,
        api::handlers::companies::toggle_company_status,
        api::handlers::tenants::migrate_tenants,
        // Company surface
        api::handlers::auth::company_login,
        api::handlers::items::list_items,
        api::handlers::items::create_item,
        api::handlers::items::get_item,
        api::handlers::items::update_item,
        api::handlers::items::delete_item,
        api::handlers::customers::list_customers,
        api::handlers::customers::create_customer,
        api::handlers::customers::get_customer,
        api::handlers::customers::update_customer,
        api::handlers::customers::delete_customer,
        api::handlers::masters::list_categories,
        api::handlers::masters::create_category,
        api::handlers::masters::get_category,
        api::handlers::masters::update_category,
        api::handlers::masters::delete_category,
        api::handlers::masters::list_tax_rates,
        api::handlers::masters::create_tax_rate,
        api::handlers::masters::get_tax_rate,
        api::handlers::masters::update_tax_rate,
        api::handlers::masters::delete_tax_rate,
        api::handlers::masters::list_units,
        api::handlers::masters::create_unit,
        api::handlers::masters::get_unit,
        api::handlers::masters::update_unit,
        api::handlers::masters::delete_unit,
        api::handlers::sales::create_sale,
        api::handlers::sales::list_sales,
        api::handlers::sales::get_sale,
        api::handlers::sales::get_invoice,
        api::handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            api::models::auth::LoginRequest,
            api::models::auth::AdminRegisterRequest,
            api::models::auth::AdminResponse,
            api::models::auth::AdminLoginResponse,
            api::models::auth::CompanySummary,
            api::models::auth::CompanyLoginResponse,
            api::models::companies::CompanyCreate,
            api::models::companies::CompanyUpdate,
            api::models::companies::CompanyResponse,
            migrations::MigrationReport,
            migrations::MigratedTenant,
            migrations::FailedTenant,
            api::models::items::ItemCreate,
            api::models::items::ItemUpdate,
            api::models::items::ItemResponse,
            api::models::customers::CustomerCreate,
            api::models::customers::CustomerUpdate,
            api::models::customers::CustomerResponse,
            api::models::masters::CategoryCreate,
            api::models::masters::CategoryUpdate,
            api::models::masters::CategoryResponse,
            api::models::masters::TaxRateCreate,
            api::models::masters::TaxRateUpdate,
            api::models::masters::TaxRateResponse,
            api::models::masters::UnitCreate,
            api::models::masters::UnitUpdate,
            api::models::masters::UnitResponse,
            api::models::sales::SaleCreate,
            api::models::sales::SaleLineCreate,
            api::models::sales::SaleResponse,
            api::models::sales::SaleLineResponse,
            api::models::dashboard::DashboardStatsResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Admin and company login"),
        (name = "companies", description = "Company records and database provisioning (admin)"),
        (name = "tenants", description = "Company database maintenance (admin)"),
        (name = "items", description = "Item master"),
        (name = "customers", description = "Customers"),
        (name = "categories", description = "Item categories"),
        (name = "taxes", description = "Tax rates"),
        (name = "units", description = "Units of measure"),
        (name = "sales", description = "Sales entry, the sales report and invoices"),
        (name = "dashboard", description = "Dashboard figures"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_both_surfaces() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/admin/api/v1/companies"));
        assert!(paths.contains_key("/admin/api/v1/tenants/migrate"));
        assert!(paths.contains_key("/company/api/v1/sales/{id}/invoice"));
        assert!(paths.contains_key("/company/api/v1/taxes/{id}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.schemas.contains_key("MigrationReport"));
    }

    #[test]
    fn sales_report_documents_its_filters() {
        let doc = ApiDoc::openapi();
        let list_sales = doc
            .paths
            .paths
            .get("/company/api/v1/sales")
            .and_then(|item| item.get.as_ref())
            .expect("GET /company/api/v1/sales");
        let names: Vec<&str> = list_sales.parameters.iter().flatten().map(|p| p.name.as_str()).collect();
        for expected in ["customerId", "from", "to"] {
            assert!(names.contains(&expected), "missing {expected} in {names:?}");
        }
    }
}
