//! Creation and removal of tenant databases.

use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use super::{
    error::TenantError,
    migrations::{self, TENANT_MIGRATIONS, TenantMigration},
    name::TenantDbName,
    registry::{TenantHandle, TenantRegistry},
};

/// SQLSTATE `duplicate_database`.
const DUPLICATE_DATABASE: &str = "42P04";

/// Creates tenant databases on the server behind the global pool and brings them to the latest
/// schema version.
#[derive(Clone, Debug)]
pub struct Provisioner {
    global: PgPool,
    registry: TenantRegistry,
    migrations: &'static [TenantMigration],
}

impl Provisioner {
    pub fn new(global: PgPool, registry: TenantRegistry) -> Self {
        Self {
            global,
            registry,
            migrations: TENANT_MIGRATIONS,
        }
    }

    /// Replace the migration list applied to new databases.
    pub fn with_migrations(mut self, migrations: &'static [TenantMigration]) -> Self {
        self.migrations = migrations;
        self
    }

    /// Create `db_name` and migrate it to the latest version.
    ///
    /// If anything fails after the database was created, the half-built database is dropped
    /// again before the original error is returned. An existing database is never touched:
    /// that case fails with [`TenantError::AlreadyExists`] before anything is created.
    #[instrument(skip(self, db_name), fields(db_name = %db_name), err)]
    pub async fn provision(&self, db_name: &TenantDbName) -> Result<TenantHandle, TenantError> {
        self.create_database(db_name).await?;

        match self.initialise(db_name).await {
            Ok(handle) => {
                info!("Provisioned tenant database");
                Ok(handle)
            }
            Err(e) => {
                warn!(error = %e, "Provisioning failed, dropping partially built database");
                if let Err(cleanup) = self.deprovision(db_name).await {
                    error!(error = %cleanup, "Failed to drop partially built tenant database");
                }
                Err(e)
            }
        }
    }

    async fn create_database(&self, db_name: &TenantDbName) -> Result<(), TenantError> {
        let sql = format!("CREATE DATABASE {}", db_name.quoted());
        sqlx::query(&sql).execute(&self.global).await.map_err(|e| {
            let duplicate = e.as_database_error().is_some_and(|db_err| {
                db_err.code().as_deref() == Some(DUPLICATE_DATABASE) || db_err.is_unique_violation()
            });
            if duplicate {
                TenantError::AlreadyExists {
                    db_name: db_name.to_string(),
                }
            } else {
                TenantError::Provision {
                    db_name: db_name.to_string(),
                    step: "create database",
                    source: e,
                }
            }
        })?;
        Ok(())
    }

    async fn initialise(&self, db_name: &TenantDbName) -> Result<TenantHandle, TenantError> {
        let handle = self.registry.get(db_name).await?;
        let applied = migrations::apply_pending(handle.pool(), self.migrations).await?;
        info!(?applied, "Applied tenant migrations");
        Ok(handle)
    }

    /// Evict the cached handle and drop the database. Dropping a database that does not exist
    /// succeeds.
    #[instrument(skip(self, db_name), fields(db_name = %db_name), err)]
    pub async fn deprovision(&self, db_name: &TenantDbName) -> Result<(), TenantError> {
        self.registry.evict(db_name).await;

        let step_failed = |step: &'static str| {
            move |source: sqlx::Error| TenantError::Provision {
                db_name: db_name.to_string(),
                step,
                source,
            }
        };

        sqlx::query("SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()")
            .bind(db_name.as_str())
            .execute(&self.global)
            .await
            .map_err(step_failed("terminate connections"))?;

        let sql = format!("DROP DATABASE IF EXISTS {}", db_name.quoted());
        sqlx::query(&sql)
            .execute(&self.global)
            .await
            .map_err(step_failed("drop database"))?;

        info!("Dropped tenant database");
        Ok(())
    }

    /// Whether a database with this name exists on the server.
    pub async fn exists(&self, db_name: &TenantDbName) -> Result<bool, TenantError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name.as_str())
            .fetch_one(&self.global)
            .await?;
        Ok(exists)
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::migrations::{current_version, latest_version};
    use crate::test_utils::TestTenants;

    /// Baseline succeeds, then the second migration fails.
    const FAILS_AFTER_BASELINE: &[TenantMigration] = &[
        TENANT_MIGRATIONS[0],
        TenantMigration {
            version: 2,
            description: "references a missing table",
            statements: &["ALTER TABLE no_such_table ADD COLUMN x INT"],
        },
    ];

    const TENANT_TABLES: [&str; 7] = ["items", "customers", "sales", "sale_lines", "categories", "tax_rates", "units"];

    #[sqlx::test]
    async fn provision_creates_the_full_schema(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let name = tenants.provision().await;
        let handle = tenants.registry.get(&name).await.unwrap();

        for table in TENANT_TABLES {
            let present: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(table)
                .fetch_one(handle.pool())
                .await
                .unwrap();
            assert!(present, "table {table} missing");
        }

        let mut fks: Vec<String> = sqlx::query_scalar(
            "SELECT conname::text FROM pg_constraint WHERE contype = 'f' AND connamespace = 'public'::regnamespace",
        )
        .fetch_all(handle.pool())
        .await
        .unwrap();
        fks.sort();
        assert_eq!(
            fks,
            vec![
                "items_category_id_fkey",
                "items_tax_id_fkey",
                "items_unit_id_fkey",
                "sale_lines_item_id_fkey",
                "sale_lines_sale_id_fkey",
                "sales_customer_id_fkey",
            ]
        );

        assert_eq!(
            current_version(handle.pool()).await.unwrap(),
            latest_version(TENANT_MIGRATIONS)
        );

        tenants.cleanup().await;
    }

    #[sqlx::test]
    async fn provisioning_an_existing_name_keeps_the_database(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let name = tenants.provision().await;
        let provisioner = tenants.provisioner();

        let handle = tenants.registry.get(&name).await.unwrap();
        sqlx::query("INSERT INTO customers (name, phone) VALUES ('Asha', '9876543210')")
            .execute(handle.pool())
            .await
            .unwrap();

        let err = provisioner.provision(&name).await.unwrap_err();
        assert!(matches!(err, TenantError::AlreadyExists { .. }));

        assert!(provisioner.exists(&name).await.unwrap());
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(handle.pool())
            .await
            .unwrap();
        assert_eq!(customers, 1);

        tenants.cleanup().await;
    }

    #[sqlx::test]
    async fn failed_migration_leaves_no_database_behind(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let provisioner = tenants.provisioner().with_migrations(FAILS_AFTER_BASELINE);
        let name = tenants.track(TenantDbName::generate());

        let err = provisioner.provision(&name).await.unwrap_err();
        assert!(matches!(err, TenantError::Migration { version: 2, .. }), "{err:?}");

        assert!(!provisioner.exists(&name).await.unwrap());
        assert!(!tenants.registry.contains(&name));

        tenants.cleanup().await;
    }

    #[sqlx::test]
    async fn deprovision_drops_the_database(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let name = tenants.provision().await;
        let provisioner = tenants.provisioner();
        let handle = tenants.registry.get(&name).await.unwrap();

        provisioner.deprovision(&name).await.unwrap();

        assert!(!provisioner.exists(&name).await.unwrap());
        assert!(handle.pool().is_closed());
        // Dropping again is a no-op.
        provisioner.deprovision(&name).await.unwrap();

        tenants.cleanup().await;
    }

    #[sqlx::test]
    async fn tenants_do_not_see_each_others_rows(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let a = tenants.provision().await;
        let b = tenants.provision().await;
        let ha = tenants.registry.get(&a).await.unwrap();
        let hb = tenants.registry.get(&b).await.unwrap();

        sqlx::query("INSERT INTO customers (name, phone) VALUES ('Asha', '9876543210')")
            .execute(ha.pool())
            .await
            .unwrap();

        let count = |pool: PgPool| async move {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
                .fetch_one(&pool)
                .await
                .unwrap()
        };
        assert_eq!(count(ha.pool().clone()).await, 1);
        assert_eq!(count(hb.pool().clone()).await, 0);

        tenants.cleanup().await;
    }
}
