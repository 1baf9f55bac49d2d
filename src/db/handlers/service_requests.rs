//! Database repository for service requests.

use crate::types::{ResidentId, ServiceRequestId, abbrev_uuid};
use crate::{
    api::models::service_requests::RequestStatus,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::service_requests::{ServiceRequestCreateDBRequest, ServiceRequestDBResponse, ServiceRequestUpdateDBRequest},
    },
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing service requests
#[derive(Debug, Clone)]
pub struct ServiceRequestFilter {
    pub skip: i64,
    pub limit: i64,
    pub resident_id: Option<ResidentId>,
    pub status: Option<RequestStatus>,
}

impl ServiceRequestFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            resident_id: None,
            status: None,
        }
    }
}

pub struct ServiceRequests<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for ServiceRequests<'c> {
    type CreateRequest = ServiceRequestCreateDBRequest;
    type UpdateRequest = ServiceRequestUpdateDBRequest;
    type Response = ServiceRequestDBResponse;
    type Id = ServiceRequestId;
    type Filter = ServiceRequestFilter;

    #[instrument(skip(self, request), fields(resident_id = %abbrev_uuid(&request.resident_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let request_id = Uuid::new_v4();

        let service_request = sqlx::query_as::<_, ServiceRequestDBResponse>(
            r#"
            INSERT INTO service_requests (id, resident_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(request.resident_id)
        .bind(&request.content)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(service_request)
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let service_request = sqlx::query_as::<_, ServiceRequestDBResponse>("SELECT * FROM service_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(service_request)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let service_requests = sqlx::query_as::<_, ServiceRequestDBResponse>(
            r#"
            SELECT * FROM service_requests
            WHERE ($1::uuid IS NULL OR resident_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.resident_id)
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(service_requests)
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(request_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let service_request = sqlx::query_as::<_, ServiceRequestDBResponse>(
            r#"
            UPDATE service_requests SET
                status = COALESCE($2, status),
                feedback = COALESCE($3, feedback),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(&request.feedback)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(service_request)
    }
}

impl<'c> ServiceRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Total count matching a filter, for pagination metadata
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ServiceRequestFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM service_requests
            WHERE ($1::uuid IS NULL OR resident_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            "#,
        )
        .bind(filter.resident_id)
        .bind(filter.status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::api::models::residents::ResidentCreate;
    use crate::db::handlers::Residents;
    use crate::db::models::residents::ResidentCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_resident(conn: &mut PgConnection, username: &str) -> ResidentId {
        let mut repo = Residents::new(conn);
        repo.create(&ResidentCreateDBRequest::from(ResidentCreate {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            phone: "555-0100".to_string(),
            display_name: None,
            role: None,
            apartment_id: None,
        }))
        .await
        .unwrap()
        .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_starts_open(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "requester").await;

        let mut repo = ServiceRequests::new(&mut conn);
        let request = repo
            .create(&ServiceRequestCreateDBRequest {
                resident_id,
                content: "Leaking faucet in the kitchen".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Open);
        assert!(request.feedback.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_status_and_feedback(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "requester").await;

        let mut repo = ServiceRequests::new(&mut conn);
        let request = repo
            .create(&ServiceRequestCreateDBRequest {
                resident_id,
                content: "Broken hallway light".to_string(),
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                request.id,
                &ServiceRequestUpdateDBRequest {
                    status: Some(RequestStatus::Resolved),
                    feedback: Some("Replaced the bulb".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, RequestStatus::Resolved);
        assert_eq!(updated.feedback.as_deref(), Some("Replaced the bulb"));
        assert!(updated.updated_at > request.updated_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_scoped_to_resident(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let first = seed_resident(&mut conn, "first").await;
        let second = seed_resident(&mut conn, "second").await;

        let mut repo = ServiceRequests::new(&mut conn);
        repo.create(&ServiceRequestCreateDBRequest {
            resident_id: first,
            content: "Mine".to_string(),
        })
        .await
        .unwrap();
        repo.create(&ServiceRequestCreateDBRequest {
            resident_id: second,
            content: "Theirs".to_string(),
        })
        .await
        .unwrap();

        let mut filter = ServiceRequestFilter::new(0, 10);
        filter.resident_id = Some(first);
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "Mine");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_missing_returns_false(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ServiceRequests::new(&mut conn);
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
    }
}
