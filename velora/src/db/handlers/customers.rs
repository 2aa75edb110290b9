//! Database repository for customers.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{ListFilter, Repository},
    models::customers::{CustomerCreateDBRequest, CustomerDBResponse, CustomerUpdateDBRequest},
};
use crate::types::{CustomerId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

pub struct Customers<'c> {
    db: &'c mut PgConnection,
}

// Search matches name, phone or email
fn push_search(query: &mut QueryBuilder<'_, Postgres>, filter: &ListFilter) {
    if let Some(pattern) = filter.search_pattern() {
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR phone ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR COALESCE(email, '') ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Customers<'c> {
    type CreateRequest = CustomerCreateDBRequest;
    type UpdateRequest = CustomerUpdateDBRequest;
    type Response = CustomerDBResponse;
    type Id = CustomerId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>(
            "INSERT INTO customers (name, phone, email) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.phone)
        .bind(&request.email)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(customer)
    }

    #[instrument(skip(self), fields(customer_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(customer)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let customers = sqlx::query_as::<_, CustomerDBResponse>("SELECT * FROM customers WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(customers.into_iter().map(|c| (c.id, c)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM customers WHERE 1=1");
        push_search(&mut query, filter);

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let customers = query.build_query_as::<CustomerDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(customers)
    }

    /// Fails with a foreign key violation while the customer still has sales.
    #[instrument(skip(self), fields(customer_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(customer_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, CustomerDBResponse>(
            r#"
            UPDATE customers SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.phone)
        .bind(&request.email)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

impl<'c> Customers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ListFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE 1=1");
        push_search(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
