//! Test utilities for integration testing.
//!
//! `#[sqlx::test]` hands each test a fresh global database with the `migrations/` directory
//! applied. Tenant databases are created next to it on the same server through
//! [`TestTenants`], which remembers every name it hands out and drops them all in
//! [`TestTenants::cleanup`].

use crate::auth::password::{Argon2Params, hash_string_with_params};
use crate::auth::session::{SessionClaims, create_session_token};
use crate::config::{AuthConfig, Config, DatabaseConfig, PasswordConfig, PoolSettings, SecurityConfig, TenantsConfig};
use crate::db::{
    handlers::{Admins, Companies, Repository},
    models::{
        admins::{AdminCreateDBRequest, AdminDBResponse},
        companies::{CompanyCreateDBRequest, CompanyDBResponse, CompanyProfile, DEFAULT_ALLOWED_TRANSACTIONS},
        customers::CustomerCreateDBRequest,
        items::ItemCreateDBRequest,
    },
};
use crate::tenancy::{Provisioner, TenantDbName, TenantHandle, TenantRegistry};
use crate::types::AdminId;
use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::{ConnectOptions, PgPool};
use std::sync::Mutex;
use uuid::Uuid;

/// Password given to every admin and company created by these helpers.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Cheap Argon2 parameters so tests don't spend their time hashing.
const TEST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

fn small_pool() -> PoolSettings {
    PoolSettings {
        max_connections: 2,
        min_connections: 0,
        acquire_timeout_secs: 10,
        ..Default::default()
    }
}

/// Connection URL of the server behind a test pool.
pub fn pool_url(pool: &PgPool) -> String {
    pool.connect_options().to_url_lossy().to_string()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig {
            // Replaced with the test pool's URL by create_test_app
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost:5432/velora".to_string()),
            pool: small_pool(),
        },
        tenants: TenantsConfig {
            pool: small_pool(),
            migrate_on_startup: false,
        },
        admin_email: "admin@test.example".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: AuthConfig {
            allow_admin_registration: true,
            password: PasswordConfig {
                argon2_memory_kib: TEST_ARGON2.memory_kib,
                argon2_iterations: TEST_ARGON2.iterations,
                argon2_parallelism: TEST_ARGON2.parallelism,
                ..Default::default()
            },
            security: SecurityConfig::default(),
        },
    }
}

/// Build the full application on top of a `#[sqlx::test]` pool.
pub async fn create_test_app(pool: PgPool) -> (TestServer, crate::AppState) {
    let mut config = create_test_config();
    config.database.url = pool_url(&pool);

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Tenant databases created by a single test.
pub struct TestTenants {
    pub registry: TenantRegistry,
    global: PgPool,
    created: Mutex<Vec<TenantDbName>>,
}

impl TestTenants {
    pub fn new(pool: &PgPool) -> Self {
        let base_url = pool.connect_options().to_url_lossy();
        Self {
            registry: TenantRegistry::new(base_url, small_pool()),
            global: pool.clone(),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn provisioner(&self) -> Provisioner {
        Provisioner::new(self.global.clone(), self.registry.clone())
    }

    /// Remember `name` so that cleanup drops it, whoever ends up creating it.
    pub fn track(&self, name: TenantDbName) -> TenantDbName {
        self.created.lock().unwrap().push(name.clone());
        name
    }

    /// Create a database with no schema at all.
    pub async fn create_empty(&self) -> TenantDbName {
        let name = TenantDbName::generate();
        self.create_named(&name).await;
        name
    }

    pub async fn create_named(&self, name: &TenantDbName) {
        self.track(name.clone());
        sqlx::query(&format!("CREATE DATABASE {}", name.quoted()))
            .execute(&self.global)
            .await
            .expect("Failed to create tenant database");
    }

    /// Provision a fully migrated tenant database.
    pub async fn provision(&self) -> TenantDbName {
        let name = self.track(TenantDbName::generate());
        self.provisioner()
            .provision(&name)
            .await
            .expect("Failed to provision tenant database");
        name
    }

    pub async fn provision_handle(&self) -> TenantHandle {
        let name = self.provision().await;
        self.registry.get(&name).await.expect("Failed to open tenant database")
    }

    /// Close every handle and drop every database this helper knows about.
    pub async fn cleanup(&self) {
        self.registry.close_all().await;
        let names: Vec<TenantDbName> = self.created.lock().unwrap().drain(..).collect();
        let provisioner = self.provisioner();
        for name in names {
            provisioner
                .deprovision(&name)
                .await
                .expect("Failed to drop tenant database");
        }
    }
}

pub async fn create_test_admin(pool: &PgPool) -> AdminDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let password_hash = hash_string_with_params(TEST_PASSWORD, Some(TEST_ARGON2)).expect("Failed to hash password");
    Admins::new(&mut conn)
        .create(&AdminCreateDBRequest {
            email: format!("admin-{}@test.example", Uuid::new_v4().simple()),
            name: "Test Admin".to_string(),
            password_hash: Some(password_hash),
        })
        .await
        .expect("Failed to create test admin")
}

/// Insert a company row for `db_name` without touching the database server.
pub async fn insert_company_record(pool: &PgPool, admin_id: AdminId, db_name: &TenantDbName) -> CompanyDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let password_hash = hash_string_with_params(TEST_PASSWORD, Some(TEST_ARGON2)).expect("Failed to hash password");
    Companies::new(&mut conn)
        .create(&CompanyCreateDBRequest {
            admin_id,
            email: format!("{db_name}@test.example"),
            name: format!("Company {db_name}"),
            password_hash,
            profile: CompanyProfile::default(),
            db_name: db_name.clone(),
            allowed_transactions: DEFAULT_ALLOWED_TRANSACTIONS.iter().map(|s| s.to_string()).collect(),
        })
        .await
        .expect("Failed to insert company record")
}

/// An item selling at `rate` with `tax` percent, buying at half and marked at `rate + 10`.
pub fn item_request(code: &str, rate: i64, tax: i64) -> ItemCreateDBRequest {
    ItemCreateDBRequest {
        item_code: code.to_string(),
        item_name: format!("Item {code}"),
        tax: Decimal::from(tax),
        purchase_rate: Decimal::from(rate) / Decimal::TWO,
        selling_rate: Decimal::from(rate),
        mrp: Decimal::from(rate + 10),
        category_id: None,
        tax_id: None,
        unit_id: None,
        image_url: None,
    }
}

pub fn customer_request(name: &str, phone: &str) -> CustomerCreateDBRequest {
    CustomerCreateDBRequest {
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
    }
}

pub fn admin_token(admin: &AdminDBResponse) -> String {
    let config = create_test_config();
    create_session_token(&SessionClaims::admin(admin.id, &admin.email, &config), &config).expect("Failed to sign token")
}

pub fn company_token(company: &CompanyDBResponse) -> String {
    let config = create_test_config();
    create_session_token(
        &SessionClaims::company(company.id, &company.email, &company.db_name, &config),
        &config,
    )
    .expect("Failed to sign token")
}
