//! Database repository for apartments.

use crate::types::{ApartmentId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::apartments::{ApartmentCreateDBRequest, ApartmentDBResponse, ApartmentUpdateDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing apartments
#[derive(Debug, Clone)]
pub struct ApartmentFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ApartmentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Apartments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Apartments<'c> {
    type CreateRequest = ApartmentCreateDBRequest;
    type UpdateRequest = ApartmentUpdateDBRequest;
    type Response = ApartmentDBResponse;
    type Id = ApartmentId;
    type Filter = ApartmentFilter;

    #[instrument(skip(self, request), fields(number = %request.number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let apartment_id = Uuid::new_v4();

        let apartment = sqlx::query_as::<_, ApartmentDBResponse>(
            r#"
            INSERT INTO apartments (id, number, floor, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(apartment_id)
        .bind(&request.number)
        .bind(request.floor)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(apartment)
    }

    #[instrument(skip(self), fields(apartment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let apartment = sqlx::query_as::<_, ApartmentDBResponse>("SELECT * FROM apartments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(apartment)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let apartments = sqlx::query_as::<_, ApartmentDBResponse>("SELECT * FROM apartments ORDER BY number LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(apartments)
    }

    #[instrument(skip(self), fields(apartment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(apartment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let apartment = sqlx::query_as::<_, ApartmentDBResponse>(
            r#"
            UPDATE apartments SET
                number = COALESCE($2, number),
                floor = COALESCE($3, floor),
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.number)
        .bind(request.floor)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(apartment)
    }
}

impl<'c> Apartments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Total apartment count, for pagination metadata
    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM apartments")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
