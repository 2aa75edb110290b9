//! Database repository for admins.

use crate::db::{
    errors::{DbError, Result},
    models::admins::{AdminCreateDBRequest, AdminDBResponse},
};
use crate::types::{AdminId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Admins<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Admins<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &AdminCreateDBRequest) -> Result<AdminDBResponse> {
        let admin = sqlx::query_as::<_, AdminDBResponse>(
            r#"
            INSERT INTO admins (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(admin)
    }

    #[instrument(skip(self), fields(admin_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: AdminId) -> Result<Option<AdminDBResponse>> {
        let admin = sqlx::query_as::<_, AdminDBResponse>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(admin)
    }

    /// Emails are matched case-insensitively.
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<AdminDBResponse>> {
        let admin = sqlx::query_as::<_, AdminDBResponse>("SELECT * FROM admins WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(admin)
    }

    #[instrument(skip(self, password_hash), fields(admin_id = %abbrev_uuid(&id)), err)]
    pub async fn set_password_hash(&mut self, id: AdminId, password_hash: &str) -> Result<AdminDBResponse> {
        sqlx::query_as::<_, AdminDBResponse>(
            r#"
            UPDATE admins SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Acquire, PgPool};

    fn request(email: &str) -> AdminCreateDBRequest {
        AdminCreateDBRequest {
            email: email.to_string(),
            name: "Test Admin".to_string(),
            password_hash: Some("hash".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_lookup_admin(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Admins::new(tx.acquire().await.unwrap());

        let created = repo.create(&request("owner@example.com")).await.unwrap();
        assert!(created.is_active);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "owner@example.com");

        let by_email = repo.get_by_email("OWNER@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_a_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Admins::new(&mut conn);

        repo.create(&request("dup@example.com")).await.unwrap();
        let err = repo.create(&request("dup@example.com")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("admins_email_key"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_set_password_hash(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Admins::new(&mut conn);

        let admin = repo
            .create(&AdminCreateDBRequest {
                email: "nopass@example.com".to_string(),
                name: "No Password".to_string(),
                password_hash: None,
            })
            .await
            .unwrap();
        assert!(admin.password_hash.is_none());

        let updated = repo.set_password_hash(admin.id, "new-hash").await.unwrap();
        assert_eq!(updated.password_hash.as_deref(), Some("new-hash"));

        let missing = repo.set_password_hash(uuid::Uuid::new_v4(), "x").await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }
}
