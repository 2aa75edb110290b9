//! Database repository for items, the product master of a tenant database.
//!
//! When a request links an item to a tax-rate record (`tax_id`), the record's current rate is
//! copied into the item's `tax` column in the same statement. The copy is taken at write time
//! only; later edits to the tax-rate record leave existing items untouched.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{ListFilter, Repository},
    models::items::{ItemCreateDBRequest, ItemDBResponse, ItemUpdateDBRequest},
};
use crate::types::{ItemId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

pub struct Items<'c> {
    db: &'c mut PgConnection,
}

fn push_search(query: &mut QueryBuilder<'_, Postgres>, filter: &ListFilter) {
    if let Some(pattern) = filter.search_pattern() {
        query.push(" AND (item_code ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR item_name ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Items<'c> {
    type CreateRequest = ItemCreateDBRequest;
    type UpdateRequest = ItemUpdateDBRequest;
    type Response = ItemDBResponse;
    type Id = ItemId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(item_code = %request.item_code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, ItemDBResponse>(
            r#"
            INSERT INTO items (
                item_code, item_name, tax, purchase_rate, selling_rate, mrp,
                category_id, tax_id, unit_id, image_url
            )
            VALUES (
                $1, $2, COALESCE((SELECT rate FROM tax_rates WHERE id = $8), $3), $4, $5, $6,
                $7, $8, $9, $10
            )
            RETURNING *
            "#,
        )
        .bind(&request.item_code)
        .bind(&request.item_name)
        .bind(request.tax)
        .bind(request.purchase_rate)
        .bind(request.selling_rate)
        .bind(request.mrp)
        .bind(request.category_id)
        .bind(request.tax_id)
        .bind(request.unit_id)
        .bind(&request.image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let item = sqlx::query_as::<_, ItemDBResponse>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let items = sqlx::query_as::<_, ItemDBResponse>("SELECT * FROM items WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(items.into_iter().map(|item| (item.id, item)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM items WHERE 1=1");
        push_search(&mut query, filter);

        query.push(" ORDER BY created_at DESC, item_code LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let items = query.build_query_as::<ItemDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(item_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, ItemDBResponse>(
            r#"
            UPDATE items SET
                item_code = COALESCE($2, item_code),
                item_name = COALESCE($3, item_name),
                tax = COALESCE((SELECT rate FROM tax_rates WHERE id = $9), $4, tax),
                purchase_rate = COALESCE($5, purchase_rate),
                selling_rate = COALESCE($6, selling_rate),
                mrp = COALESCE($7, mrp),
                category_id = CASE WHEN $12 THEN $8 ELSE category_id END,
                tax_id = CASE WHEN $13 THEN $9 ELSE tax_id END,
                unit_id = CASE WHEN $14 THEN $10 ELSE unit_id END,
                image_url = COALESCE($11, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.item_code)
        .bind(&request.item_name)
        .bind(request.tax)
        .bind(request.purchase_rate)
        .bind(request.selling_rate)
        .bind(request.mrp)
        .bind(request.category_id.flatten())
        .bind(request.tax_id.flatten())
        .bind(request.unit_id.flatten())
        .bind(&request.image_url)
        .bind(request.category_id.is_some())
        .bind(request.tax_id.is_some())
        .bind(request.unit_id.is_some())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

impl<'c> Items<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM items WHERE 1=1");
        push_search(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Categories, TaxRates, Units};
    use crate::db::models::masters::{CategoryCreateDBRequest, TaxRateCreateDBRequest, TaxRateUpdateDBRequest, UnitCreateDBRequest};
    use crate::test_utils::{TestTenants, item_request};
    use rust_decimal::Decimal;

    #[sqlx::test]
    #[test_log::test]
    async fn test_item_crud(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();
        let mut repo = Items::new(&mut conn);

        let created = repo.create(&item_request("ITM001", 100, 18)).await.unwrap();
        assert_eq!(created.selling_rate, Decimal::from(100));
        assert_eq!(created.tax, Decimal::from(18));

        let updated = repo
            .update(
                created.id,
                &ItemUpdateDBRequest {
                    item_name: Some("Renamed".to_string()),
                    image_url: Some("https://cdn.example.com/itm001.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.item_name, "Renamed");
        assert_eq!(updated.item_code, "ITM001");
        assert!(updated.image_url.is_some());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());

        drop(conn);
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_item_code(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();
        let mut repo = Items::new(&mut conn);

        repo.create(&item_request("DUP", 10, 0)).await.unwrap();
        let err = repo.create(&item_request("DUP", 20, 0)).await.unwrap_err();
        match err {
            DbError::UniqueViolation {
                constraint,
                conflicting_value,
                ..
            } => {
                assert_eq!(constraint.as_deref(), Some("items_item_code_key"));
                assert_eq!(conflicting_value.as_deref(), Some("DUP"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        drop(conn);
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_linked_tax_rate_is_copied_once(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();

        let gst = TaxRates::new(&mut conn)
            .create(&TaxRateCreateDBRequest { rate: Decimal::from(12) })
            .await
            .unwrap();

        let mut request = item_request("TAXED", 50, 5);
        request.tax_id = Some(gst.id);
        let item = Items::new(&mut conn).create(&request).await.unwrap();
        assert_eq!(item.tax, Decimal::from(12));

        // Editing the rate afterwards does not reach existing items
        TaxRates::new(&mut conn)
            .update(
                gst.id,
                &TaxRateUpdateDBRequest {
                    rate: Some(Decimal::from(28)),
                },
            )
            .await
            .unwrap();
        let unchanged = Items::new(&mut conn).get_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(unchanged.tax, Decimal::from(12));

        // Re-linking on update picks up the current rate
        let relinked = Items::new(&mut conn)
            .update(
                item.id,
                &ItemUpdateDBRequest {
                    tax_id: Some(Some(gst.id)),
                    tax: Some(Decimal::from(3)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(relinked.tax, Decimal::from(28));

        drop(conn);
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_links_can_be_cleared_on_update(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();

        let category = Categories::new(&mut conn)
            .create(&CategoryCreateDBRequest {
                name: "Personal care".to_string(),
            })
            .await
            .unwrap();
        let gst = TaxRates::new(&mut conn)
            .create(&TaxRateCreateDBRequest { rate: Decimal::from(18) })
            .await
            .unwrap();
        let unit = Units::new(&mut conn)
            .create(&UnitCreateDBRequest { symbol: "pcs".to_string() })
            .await
            .unwrap();

        let mut request = item_request("LINKED", 40, 0);
        request.category_id = Some(category.id);
        request.tax_id = Some(gst.id);
        request.unit_id = Some(unit.id);
        let item = Items::new(&mut conn).create(&request).await.unwrap();

        // Leaving the links out keeps them
        let renamed = Items::new(&mut conn)
            .update(
                item.id,
                &ItemUpdateDBRequest {
                    item_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.category_id, Some(category.id));
        assert_eq!(renamed.tax_id, Some(gst.id));

        let unlinked = Items::new(&mut conn)
            .update(
                item.id,
                &ItemUpdateDBRequest {
                    category_id: Some(None),
                    tax_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unlinked.category_id, None);
        assert_eq!(unlinked.tax_id, None);
        assert_eq!(unlinked.unit_id, Some(unit.id));
        assert_eq!(unlinked.tax, Decimal::from(18));

        drop(conn);
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_tax_rate_is_a_foreign_key_violation(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();

        let mut request = item_request("ORPHAN", 10, 0);
        request.tax_id = Some(uuid::Uuid::new_v4());
        let err = Items::new(&mut conn).create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        drop(conn);
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_and_count(pool: sqlx::PgPool) {
        let tenants = TestTenants::new(&pool);
        let tenant = tenants.provision_handle().await;
        let mut conn = tenant.pool().acquire().await.unwrap();
        let mut repo = Items::new(&mut conn);

        for code in ["SOAP01", "SOAP02", "RICE01"] {
            repo.create(&item_request(code, 10, 0)).await.unwrap();
        }

        let soap = ListFilter::new(0, 10).with_search(Some("soap".to_string()));
        assert_eq!(repo.list(&soap).await.unwrap().len(), 2);
        assert_eq!(repo.count(&soap).await.unwrap(), 2);

        let page = repo.list(&ListFilter::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(repo.count(&ListFilter::new(0, 10)).await.unwrap(), 3);

        drop(conn);
        tenants.cleanup().await;
    }
}
