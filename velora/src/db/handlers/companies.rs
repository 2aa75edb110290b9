//! Database repository for companies, the tenant records of the global database.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::companies::{CompanyCreateDBRequest, CompanyDBResponse, CompanyUpdateDBRequest},
};
use crate::types::{AdminId, CompanyId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing companies
#[derive(Debug, Clone)]
pub struct CompanyFilter {
    pub skip: i64,
    pub limit: i64,
    /// Only companies owned by this admin
    pub admin_id: Option<AdminId>,
}

impl CompanyFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            admin_id: None,
        }
    }

    pub fn owned_by(mut self, admin_id: AdminId) -> Self {
        self.admin_id = Some(admin_id);
        self
    }
}

pub struct Companies<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Companies<'c> {
    type CreateRequest = CompanyCreateDBRequest;
    type UpdateRequest = CompanyUpdateDBRequest;
    type Response = CompanyDBResponse;
    type Id = CompanyId;
    type Filter = CompanyFilter;

    #[instrument(skip(self, request), fields(email = %request.email, db_name = %request.db_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = &request.profile;
        let company = sqlx::query_as::<_, CompanyDBResponse>(
            r#"
            INSERT INTO companies (
                admin_id, email, name, password_hash, phone, logo, address, city, state,
                country, pin_code, gst_number, db_name, allowed_transactions
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(request.admin_id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .bind(&profile.phone)
        .bind(&profile.logo)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.country)
        .bind(&profile.pin_code)
        .bind(&profile.gst_number)
        .bind(request.db_name.as_str())
        .bind(&request.allowed_transactions)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(company)
    }

    #[instrument(skip(self), fields(company_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let company = sqlx::query_as::<_, CompanyDBResponse>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(company)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let companies = sqlx::query_as::<_, CompanyDBResponse>("SELECT * FROM companies WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(companies.into_iter().map(|c| (c.id, c)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM companies WHERE 1=1");

        if let Some(admin_id) = filter.admin_id {
            query.push(" AND admin_id = ");
            query.push_bind(admin_id);
        }

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let companies = query.build_query_as::<CompanyDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(companies)
    }

    /// Removes the record only. The tenant database stays on the server.
    #[instrument(skip(self), fields(company_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(company_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = &request.profile;
        // db_name is never in the SET list
        sqlx::query_as::<_, CompanyDBResponse>(
            r#"
            UPDATE companies SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                phone = COALESCE($5, phone),
                logo = COALESCE($6, logo),
                address = COALESCE($7, address),
                city = COALESCE($8, city),
                state = COALESCE($9, state),
                country = COALESCE($10, country),
                pin_code = COALESCE($11, pin_code),
                gst_number = COALESCE($12, gst_number),
                is_active = COALESCE($13, is_active),
                allowed_transactions = COALESCE($14, allowed_transactions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .bind(&profile.phone)
        .bind(&profile.logo)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.country)
        .bind(&profile.pin_code)
        .bind(&profile.gst_number)
        .bind(request.is_active)
        .bind(&request.allowed_transactions)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

impl<'c> Companies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CompanyFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM companies WHERE 1=1");

        if let Some(admin_id) = filter.admin_id {
            query.push(" AND admin_id = ");
            query.push_bind(admin_id);
        }

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Emails are matched case-insensitively.
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<CompanyDBResponse>> {
        let company = sqlx::query_as::<_, CompanyDBResponse>("SELECT * FROM companies WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(company)
    }

    /// Flip `is_active` and return the updated record.
    #[instrument(skip(self), fields(company_id = %abbrev_uuid(&id)), err)]
    pub async fn toggle_status(&mut self, id: CompanyId) -> Result<CompanyDBResponse> {
        sqlx::query_as::<_, CompanyDBResponse>(
            r#"
            UPDATE companies SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::companies::{CompanyProfile, DEFAULT_ALLOWED_TRANSACTIONS};
    use crate::tenancy::TenantDbName;
    use crate::test_utils::create_test_admin;
    use sqlx::{Acquire, PgPool};

    fn request(admin_id: AdminId, email: &str) -> CompanyCreateDBRequest {
        CompanyCreateDBRequest {
            admin_id,
            email: email.to_string(),
            name: "Acme Traders".to_string(),
            password_hash: "hash".to_string(),
            profile: CompanyProfile {
                city: Some("Pune".to_string()),
                ..Default::default()
            },
            db_name: TenantDbName::generate(),
            allowed_transactions: DEFAULT_ALLOWED_TRANSACTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_company(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Companies::new(tx.acquire().await.unwrap());

        let req = request(admin.id, "acme@example.com");
        let created = repo.create(&req).await.unwrap();
        assert_eq!(created.db_name, req.db_name);
        assert!(created.is_active);
        assert_eq!(created.allowed_transactions, vec!["new-sales".to_string()]);
        assert_eq!(created.city.as_deref(), Some("Pune"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "acme@example.com");

        let by_email = repo.get_by_email("ACME@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_rejected(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Companies::new(&mut conn);

        repo.create(&request(admin.id, "same@example.com")).await.unwrap();
        let err = repo.create(&request(admin.id, "same@example.com")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref constraint, .. } if constraint.as_deref() == Some("companies_email_key")
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_leaves_db_name_alone(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Companies::new(&mut conn);

        let created = repo.create(&request(admin.id, "upd@example.com")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &CompanyUpdateDBRequest {
                    name: Some("Renamed".to_string()),
                    profile: CompanyProfile {
                        phone: Some("9876543210".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.phone.as_deref(), Some("9876543210"));
        assert_eq!(updated.city.as_deref(), Some("Pune"));
        assert_eq!(updated.db_name, created.db_name);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_db_name_cannot_be_rewritten_in_sql(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let created = Companies::new(&mut conn)
            .create(&request(admin.id, "immutable@example.com"))
            .await
            .unwrap();

        let result = sqlx::query("UPDATE companies SET db_name = 'tenant_other' WHERE id = $1")
            .bind(created.id)
            .execute(&mut *conn)
            .await;
        assert!(matches!(result.map_err(DbError::from), Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_toggle_status_and_list(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let other_admin = crate::test_utils::create_test_admin(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Companies::new(&mut conn);

        let first = repo.create(&request(admin.id, "one@example.com")).await.unwrap();
        repo.create(&request(admin.id, "two@example.com")).await.unwrap();
        repo.create(&request(other_admin.id, "three@example.com")).await.unwrap();

        let toggled = repo.toggle_status(first.id).await.unwrap();
        assert!(!toggled.is_active);
        let toggled_back = repo.toggle_status(first.id).await.unwrap();
        assert!(toggled_back.is_active);

        let filter = CompanyFilter::new(0, 10).owned_by(admin.id);
        let owned = repo.list(&filter).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|c| c.admin_id == admin.id));
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(repo.count(&CompanyFilter::new(0, 10)).await.unwrap(), 3);

        let bulk = repo.get_bulk(vec![first.id]).await.unwrap();
        assert!(bulk.contains_key(&first.id));

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
        assert!(matches!(repo.toggle_status(first.id).await, Err(DbError::NotFound)));
    }
}
