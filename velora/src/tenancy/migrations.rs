//! Versioned schema migrations for tenant databases.
//!
//! Every tenant database carries a `schema_version` table with one row per applied migration.
//! [`apply_pending`] brings a single database up to date; [`migrate_all`] walks every company
//! in the global database and does the same for each of them.
//!
//! Each migration runs in its own transaction together with the insert of its
//! `schema_version` row, so a failing statement leaves neither tables nor a version record
//! behind. The transaction also holds an `EXCLUSIVE` lock on `schema_version`, which serialises
//! runners racing on the same database: the loser waits, re-reads the current version and skips
//! what the winner already applied.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{error::TenantError, name::TenantDbName, registry::TenantRegistry};

#[derive(Debug, Clone, Copy)]
pub struct TenantMigration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

const CREATE_SCHEMA_VERSION: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

/// Baseline schema. Tables first, then the item-code index, then foreign keys.
const V1_BASELINE: &[&str] = &[
    r#"CREATE TABLE items (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        item_code TEXT NOT NULL,
        item_name TEXT NOT NULL,
        tax NUMERIC(5, 2) NOT NULL DEFAULT 0,
        purchase_rate NUMERIC(12, 2) NOT NULL DEFAULT 0,
        selling_rate NUMERIC(12, 2) NOT NULL,
        mrp NUMERIC(12, 2) NOT NULL,
        category_id UUID,
        tax_id UUID,
        unit_id UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE customers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE sales (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL,
        total_amount NUMERIC(14, 2) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE sale_lines (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        sale_id UUID NOT NULL,
        item_id UUID NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        discount NUMERIC(5, 2) NOT NULL DEFAULT 0 CHECK (discount >= 0 AND discount <= 100),
        position INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE categories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE tax_rates (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        rate NUMERIC(5, 2) NOT NULL CHECK (rate >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE units (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        symbol TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE UNIQUE INDEX items_item_code_key ON items (item_code)",
    "CREATE INDEX sales_created_at_idx ON sales (created_at DESC)",
    "CREATE UNIQUE INDEX sale_lines_sale_position_key ON sale_lines (sale_id, position)",
    r#"ALTER TABLE sales ADD CONSTRAINT sales_customer_id_fkey
        FOREIGN KEY (customer_id) REFERENCES customers (id) ON DELETE RESTRICT"#,
    r#"ALTER TABLE sale_lines ADD CONSTRAINT sale_lines_sale_id_fkey
        FOREIGN KEY (sale_id) REFERENCES sales (id) ON DELETE CASCADE"#,
    r#"ALTER TABLE sale_lines ADD CONSTRAINT sale_lines_item_id_fkey
        FOREIGN KEY (item_id) REFERENCES items (id) ON DELETE RESTRICT"#,
    r#"ALTER TABLE items ADD CONSTRAINT items_category_id_fkey
        FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE SET NULL"#,
    r#"ALTER TABLE items ADD CONSTRAINT items_tax_id_fkey
        FOREIGN KEY (tax_id) REFERENCES tax_rates (id) ON DELETE SET NULL"#,
    r#"ALTER TABLE items ADD CONSTRAINT items_unit_id_fkey
        FOREIGN KEY (unit_id) REFERENCES units (id) ON DELETE SET NULL"#,
];

const V2_ITEM_IMAGE: &[&str] = &["ALTER TABLE items ADD COLUMN image_url TEXT"];

/// Every tenant migration, in ascending version order.
pub const TENANT_MIGRATIONS: &[TenantMigration] = &[
    TenantMigration {
        version: 1,
        description: "baseline schema",
        statements: V1_BASELINE,
    },
    TenantMigration {
        version: 2,
        description: "item image url",
        statements: V2_ITEM_IMAGE,
    },
];

/// Highest version in `migrations`.
pub fn latest_version(migrations: &[TenantMigration]) -> i64 {
    migrations.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Highest applied version, or 0 for a database that has never been migrated.
pub async fn current_version(pool: &PgPool) -> Result<i64, TenantError> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass('schema_version') IS NOT NULL")
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(0);
    }
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

async fn locked_version(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    sqlx::query("LOCK TABLE schema_version IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&mut *conn)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the database's current version. Returns the versions that
/// were applied by this call, in order.
#[instrument(skip_all, err)]
pub async fn apply_pending(pool: &PgPool, migrations: &[TenantMigration]) -> Result<Vec<i64>, TenantError> {
    // CREATE TABLE IF NOT EXISTS is not safe against a concurrent creator, so first-time
    // runners queue on a database-local advisory lock.
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('schema_version'))")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_SCHEMA_VERSION).execute(&mut *tx).await?;
    tx.commit().await?;

    let mut applied = Vec::new();
    for migration in migrations {
        let mut tx = pool.begin().await?;
        let current = locked_version(&mut tx).await?;
        if migration.version <= current {
            tx.rollback().await?;
            continue;
        }

        let failed = |source: sqlx::Error| TenantError::Migration {
            version: migration.version,
            description: migration.description,
            source,
        };
        for statement in migration.statements {
            sqlx::query(*statement).execute(&mut *tx).await.map_err(failed)?;
        }
        sqlx::query("INSERT INTO schema_version (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        info!(version = migration.version, description = migration.description, "Applied tenant migration");
        applied.push(migration.version);
    }

    Ok(applied)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigratedTenant {
    pub db_name: String,
    pub applied: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailedTenant {
    pub db_name: String,
    pub error: String,
}

/// Outcome of running migrations across every tenant.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub migrated: Vec<MigratedTenant>,
    pub up_to_date: Vec<String>,
    pub failed: Vec<FailedTenant>,
}

/// Bring every company's tenant database up to date.
///
/// A failure on one tenant is recorded in the report and does not stop the others.
#[instrument(skip_all, err)]
pub async fn migrate_all(
    global: &PgPool,
    registry: &TenantRegistry,
    migrations: &[TenantMigration],
) -> Result<MigrationReport, TenantError> {
    let db_names: Vec<String> = sqlx::query_scalar("SELECT db_name FROM companies ORDER BY created_at")
        .fetch_all(global)
        .await?;

    let mut report = MigrationReport::default();
    for raw in db_names {
        match migrate_one(&raw, registry, migrations).await {
            Ok(applied) if applied.is_empty() => report.up_to_date.push(raw),
            Ok(applied) => report.migrated.push(MigratedTenant { db_name: raw, applied }),
            Err(e) => {
                warn!(db_name = %raw, error = %e, "Tenant migration failed");
                report.failed.push(FailedTenant {
                    db_name: raw,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        migrated = report.migrated.len(),
        up_to_date = report.up_to_date.len(),
        failed = report.failed.len(),
        "Tenant migration run finished"
    );
    Ok(report)
}

async fn migrate_one(raw: &str, registry: &TenantRegistry, migrations: &[TenantMigration]) -> Result<Vec<i64>, TenantError> {
    let db_name = TenantDbName::parse(raw)?;
    let handle = registry.get(&db_name).await?;
    apply_pending(handle.pool(), migrations).await
}
