//! # velora: multi-tenant billing and inventory backend
//!
//! Velora serves two HTTP surfaces from one process:
//!
//! - **Admin surface** (`/admin/api/v1/*`): platform administrators register, log in and manage
//!   companies. Creating a company provisions a dedicated PostgreSQL database for it.
//! - **Company surface** (`/company/api/v1/*`): a company logs in and works with its own items,
//!   customers, masters, sales, invoices and dashboard. Every request is routed to the company's
//!   database by the `dbName` carried in its session token.
//!
//! ## Architecture
//!
//! The **global database** holds admins and the company registry (`companies` table, each row
//! naming its tenant database). Its schema is managed by the SQLx migrations in `migrations/`.
//!
//! Each **tenant database** holds one company's business data. Its schema is versioned separately
//! (see [`tenancy::migrations`]) and applied when the database is provisioned, and again on demand
//! through `POST /admin/api/v1/tenants/migrate` or at startup.
//!
//! Tenant connection pools are created lazily and kept in the [`tenancy::TenantRegistry`], so a
//! request for a company whose pool is already open reuses it.
//!
//! ## Getting Started
//!
//! ```no_run
//! use velora::{Application, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let args = velora::config::Args { config: "config.yaml".into(), validate: false };
//! let config = Config::load(&args)?;
//! velora::telemetry::init_telemetry()?;
//!
//! let app = Application::new(config).await?;
//! app.serve(async {
//!     tokio::signal::ctrl_c().await.ok();
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`]: HTTP request and response models and handlers for both surfaces
//! - [`auth`]: password hashing, session tokens and request extractors
//! - [`tenancy`]: tenant database names, provisioning, the connection registry and tenant migrations
//! - [`db`]: repositories over the global and tenant schemas
//! - [`billing`] and [`invoice`]: sale line arithmetic and invoice rendering
//! - [`config`]: configuration loading and validation

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod errors;
pub mod invoice;
mod openapi;
pub mod telemetry;
pub mod tenancy;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::password::{self, Argon2Params},
    config::{CorsOrigin, PasswordConfig},
    db::{handlers::Admins, models::admins::AdminCreateDBRequest},
    errors::Error,
    openapi::ApiDoc,
    tenancy::{Provisioner, TenantRegistry, migrations},
};
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{get, patch, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AdminId, CompanyId};

/// Application state shared across all request handlers.
///
/// - `db`: pool for the global database (admins and companies)
/// - `config`: configuration loaded at startup
/// - `registry`: open connection pools to tenant databases, keyed by database name
/// - `provisioner`: creates and drops tenant databases
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub registry: TenantRegistry,
    pub provisioner: Provisioner,
}

/// Get the global database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured admin if it doesn't exist yet.
///
/// An existing admin keeps its record; when a password is configured its hash is replaced so the
/// configured password always works after a restart.
#[instrument(skip_all, fields(email = %email))]
pub async fn create_initial_admin(email: &str, password: Option<&str>, rules: &PasswordConfig, db: &PgPool) -> Result<AdminId, Error> {
    let password_hash = password
        .map(|pwd| password::hash_string_with_params(pwd, Some(Argon2Params::from(rules))))
        .transpose()?;

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut admins = Admins::new(&mut tx);

    if let Some(existing) = admins.get_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            admins.set_password_hash(existing.id, &password_hash).await?;
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        return Ok(existing.id);
    }

    let created = admins
        .create(&AdminCreateDBRequest {
            email: email.to_string(),
            name: "Administrator".to_string(),
            password_hash,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    info!("Created initial admin");
    Ok(created.id)
}

/// Connect to the global database (unless a pool is supplied), run its migrations and make sure
/// the initial admin exists.
async fn setup_database(config: &Config, pool: Option<PgPool>) -> anyhow::Result<PgPool> {
    let pool = match pool {
        Some(pool) => pool,
        None => config.database.pool.options().connect(&config.database.url).await?,
    };

    migrator().run(&pool).await?;
    create_initial_admin(
        &config.admin_email,
        config.admin_password.as_deref(),
        &config.auth.password,
        &pool,
    )
    .await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.auth.security.cors;

    let mut origins = Vec::new();
    for origin in &cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(cors.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE, http::header::ACCEPT])
        .expose_headers([http::header::LOCATION]);

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(layer)
}

fn admin_routes() -> Router<AppState> {
    use api::handlers::{auth, companies, tenants};

    Router::new()
        .route("/authentication/login", post(auth::admin_login))
        .route("/authentication/register", post(auth::admin_register))
        .route("/companies", get(companies::list_companies).post(companies::create_company))
        .route(
            "/companies/{id}",
            put(companies::update_company).delete(companies::delete_company),
        )
        .route("/companies/{id}/toggle-status", patch(companies::toggle_company_status))
        .route("/tenants/migrate", post(tenants::migrate_tenants))
}

fn company_routes() -> Router<AppState> {
    use api::handlers::{auth, customers, dashboard, items, masters, sales};

    Router::new()
        .route("/authentication/login", post(auth::company_login))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/{id}",
            get(items::get_item).put(items::update_item).delete(items::delete_item),
        )
        // Customers
        .route("/customers", get(customers::list_customers).post(customers::create_customer))
        .route(
            "/customers/{id}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        // Masters
        .route("/categories", get(masters::list_categories).post(masters::create_category))
        .route(
            "/categories/{id}",
            get(masters::get_category)
                .put(masters::update_category)
                .delete(masters::delete_category),
        )
        .route("/taxes", get(masters::list_tax_rates).post(masters::create_tax_rate))
        .route(
            "/taxes/{id}",
            get(masters::get_tax_rate)
                .put(masters::update_tax_rate)
                .delete(masters::delete_tax_rate),
        )
        .route("/units", get(masters::list_units).post(masters::create_unit))
        .route(
            "/units/{id}",
            get(masters::get_unit).put(masters::update_unit).delete(masters::delete_unit),
        )
        // Sales
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/{id}", get(sales::get_sale))
        .route("/sales/{id}/invoice", get(sales::get_invoice))
        .route("/dashboard/stats", get(dashboard::get_stats))
}

/// Build the application router with both API surfaces, docs and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/admin/api/v1", admin_routes())
        .nest("/company/api/v1", company_routes())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service: router, shared state and the global pool.
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the configured global database and build the application.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Build the application, optionally on an existing global pool.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        let pool = setup_database(&config, pool).await?;

        let registry = TenantRegistry::new(config.database_base_url()?, config.tenants.pool.clone());
        let provisioner = Provisioner::new(pool.clone(), registry.clone());

        if config.tenants.migrate_on_startup {
            let report = migrations::migrate_all(&pool, &registry, migrations::TENANT_MIGRATIONS).await?;
            info!(
                migrated = report.migrated.len(),
                up_to_date = report.up_to_date.len(),
                failed = report.failed.len(),
                "Tenant databases checked"
            );
            for failed in &report.failed {
                warn!(db_name = %failed.db_name, error = %failed.error, "Tenant database left behind");
            }
        }

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .registry(registry)
            .provisioner(provisioner)
            .build();

        let router = build_router(app_state.clone())?;

        Ok(Self {
            router,
            app_state,
            config,
            pool,
        })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, AppState) {
        let server = axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server");
        (server, self.app_state)
    }

    /// Serve until `shutdown` resolves, then close every pool.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Velora listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing tenant connections...");
        self.app_state.registry.close_all().await;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
