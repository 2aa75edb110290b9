//! Database repository for tax-rate records.
//!
//! Editing a rate here does not touch items that were linked to it earlier; see
//! [`super::items`] for how the rate is copied onto an item.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{ListFilter, Repository},
    models::masters::{TaxRateCreateDBRequest, TaxRateDBResponse, TaxRateUpdateDBRequest},
};
use crate::types::{TaxRateId, abbrev_uuid};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

pub struct TaxRates<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for TaxRates<'c> {
    type CreateRequest = TaxRateCreateDBRequest;
    type UpdateRequest = TaxRateUpdateDBRequest;
    type Response = TaxRateDBResponse;
    type Id = TaxRateId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(rate = %request.rate), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let rate = sqlx::query_as::<_, TaxRateDBResponse>("INSERT INTO tax_rates (rate) VALUES ($1) RETURNING *")
            .bind(request.rate)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(rate)
    }

    #[instrument(skip(self), fields(tax_rate_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let rate = sqlx::query_as::<_, TaxRateDBResponse>("SELECT * FROM tax_rates WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(rate)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rates = sqlx::query_as::<_, TaxRateDBResponse>("SELECT * FROM tax_rates WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rates.into_iter().map(|r| (r.id, r)).collect())
    }

    /// Search does not apply to rates.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rates = sqlx::query_as::<_, TaxRateDBResponse>("SELECT * FROM tax_rates ORDER BY rate LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rates)
    }

    #[instrument(skip(self), fields(tax_rate_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tax_rates WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(tax_rate_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, TaxRateDBResponse>(
            r#"
            UPDATE tax_rates SET rate = COALESCE($2, rate), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.rate)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

impl<'c> TaxRates<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTenants;
    use rust_decimal::Decimal;

    #[sqlx::test]
    #[test_log::test]
    async fn test_rates_are_listed_in_ascending_order(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();
        let mut repo = TaxRates::new(&mut conn);

        for rate in [18, 5, 12] {
            repo.create(&TaxRateCreateDBRequest { rate: Decimal::from(rate) })
                .await
                .unwrap();
        }

        let rates: Vec<_> = repo
            .list(&ListFilter::new(0, 10))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.rate)
            .collect();
        assert_eq!(rates, vec![Decimal::from(5), Decimal::from(12), Decimal::from(18)]);

        let negative = repo.create(&TaxRateCreateDBRequest { rate: Decimal::from(-1) }).await;
        assert!(matches!(negative, Err(DbError::CheckViolation { .. })));

        drop(conn);
        tenants.cleanup().await;
    }
}
