//! Database repository for units of measure.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{ListFilter, Repository},
    models::masters::{UnitCreateDBRequest, UnitDBResponse, UnitUpdateDBRequest},
};
use crate::types::{UnitId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

pub struct Units<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Units<'c> {
    type CreateRequest = UnitCreateDBRequest;
    type UpdateRequest = UnitUpdateDBRequest;
    type Response = UnitDBResponse;
    type Id = UnitId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(symbol = %request.symbol), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let unit = sqlx::query_as::<_, UnitDBResponse>("INSERT INTO units (symbol) VALUES ($1) RETURNING *")
            .bind(&request.symbol)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(unit)
    }

    #[instrument(skip(self), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let unit = sqlx::query_as::<_, UnitDBResponse>("SELECT * FROM units WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(unit)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let units = sqlx::query_as::<_, UnitDBResponse>("SELECT * FROM units WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(units.into_iter().map(|u| (u.id, u)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM units WHERE 1=1");
        if let Some(pattern) = filter.search_pattern() {
            query.push(" AND symbol ILIKE ");
            query.push_bind(pattern);
        }
        query.push(" ORDER BY symbol LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let units = query.build_query_as::<UnitDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(units)
    }

    #[instrument(skip(self), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(unit_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        sqlx::query_as::<_, UnitDBResponse>(
            r#"
            UPDATE units SET symbol = COALESCE($2, symbol), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.symbol)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or_else(|| DbError::NotFound)
    }
}

impl<'c> Units<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
