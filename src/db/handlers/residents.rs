//! Database repository for residents.

use crate::types::{ResidentId, abbrev_uuid};
use crate::{
    api::models::residents::{ResidencyStatus, ResidentRole},
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::residents::{ResidentCreateDBRequest, ResidentDBResponse, ResidentUpdateDBRequest},
    },
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing residents
#[derive(Debug, Clone)]
pub struct ResidentFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring match on username, email, or display_name
    pub search: Option<String>,
    /// Defaults to active residents when not specified
    pub status: Option<ResidencyStatus>,
    pub role: Option<ResidentRole>,
}

impl ResidentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            search: None,
            status: Some(ResidencyStatus::Active),
            role: None,
        }
    }
}

pub struct Residents<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Residents<'c> {
    type CreateRequest = ResidentCreateDBRequest;
    type UpdateRequest = ResidentUpdateDBRequest;
    type Response = ResidentDBResponse;
    type Id = ResidentId;
    type Filter = ResidentFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a new ID for residents
        let resident_id = Uuid::new_v4();

        let resident = sqlx::query_as::<_, ResidentDBResponse>(
            r#"
            INSERT INTO residents (id, username, email, phone, display_name, role, apartment_id, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(resident_id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.display_name)
        .bind(request.role)
        .bind(request.apartment_id)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(resident)
    }

    #[instrument(skip(self), fields(resident_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let resident = sqlx::query_as::<_, ResidentDBResponse>("SELECT * FROM residents WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(resident)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let residents = sqlx::query_as::<_, ResidentDBResponse>(
            r#"
            SELECT * FROM residents
            WHERE ($1::resident_role IS NULL OR role = $1)
              AND ($2::residency_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR username ILIKE '%' || $3 || '%'
                   OR email ILIKE '%' || $3 || '%'
                   OR display_name ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.role)
        .bind(filter.status)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(residents)
    }

    /// Soft delete: flips an active resident to inactive. Returns false when
    /// the resident is already inactive (or does not exist).
    #[instrument(skip(self), fields(resident_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("UPDATE residents SET status = 'inactive', updated_at = NOW() WHERE id = $1 AND status = 'active'")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(resident_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let resident = sqlx::query_as::<_, ResidentDBResponse>(
            r#"
            UPDATE residents SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                display_name = COALESCE($5, display_name),
                role = COALESCE($6, role),
                status = COALESCE($7, status),
                apartment_id = COALESCE($8, apartment_id),
                password_hash = COALESCE($9, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.display_name)
        .bind(request.role)
        .bind(request.status)
        .bind(request.apartment_id)
        .bind(&request.password_hash)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(resident)
    }
}

impl<'c> Residents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<ResidentDBResponse>> {
        let resident = sqlx::query_as::<_, ResidentDBResponse>("SELECT * FROM residents WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(resident)
    }

    /// Total count matching a filter, for pagination metadata
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ResidentFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM residents
            WHERE ($1::resident_role IS NULL OR role = $1)
              AND ($2::residency_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR username ILIKE '%' || $3 || '%'
                   OR email ILIKE '%' || $3 || '%'
                   OR display_name ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(filter.role)
        .bind(filter.status)
        .bind(&filter.search)
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
    use crate::db::models::residents::ResidentCreateDBRequest;
    use sqlx::PgPool;

    fn create_request(username: &str, email: &str) -> ResidentCreateDBRequest {
        ResidentCreateDBRequest::from(ResidentCreate {
            username: username.to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            display_name: Some("Test Resident".to_string()),
            role: Some(ResidentRole::Resident),
            apartment_id: None,
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_resident(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        let resident = repo.create(&create_request("testresident", "test@example.com")).await.unwrap();
        assert_eq!(resident.username, "testresident");
        assert_eq!(resident.email, "test@example.com");
        assert_eq!(resident.role, ResidentRole::Resident);
        assert_eq!(resident.status, ResidencyStatus::Active);
        assert!(resident.password_hash.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        repo.create(&create_request("first", "same@example.com")).await.unwrap();
        let err = repo.create(&create_request("second", "same@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_email(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        let created = repo.create(&create_request("emailresident", "email@example.com")).await.unwrap();

        let found = repo.get_by_email("email@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "emailresident");

        assert!(repo.get_by_email("missing@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partial_update_keeps_existing_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        let created = repo.create(&create_request("partial", "partial@example.com")).await.unwrap();

        let update = ResidentUpdateDBRequest {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.phone, "555-0199");
        assert_eq!(updated.username, "partial");
        assert_eq!(updated.email, "partial@example.com");
        assert!(updated.updated_at > created.updated_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_soft_delete_flips_status_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        let created = repo.create(&create_request("leaver", "leaver@example.com")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());

        // Row still exists, now inactive
        let resident = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(resident.status, ResidencyStatus::Inactive);

        // Second delete is a no-op
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_defaults_to_active(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        let active = repo.create(&create_request("active", "active@example.com")).await.unwrap();
        let inactive = repo.create(&create_request("inactive", "inactive@example.com")).await.unwrap();
        repo.delete(inactive.id).await.unwrap();

        let listed = repo.list(&ResidentFilter::new(0, 10)).await.unwrap();
        assert!(listed.iter().any(|r| r.id == active.id));
        assert!(!listed.iter().any(|r| r.id == inactive.id));

        // Opt in to inactive residents
        let mut filter = ResidentFilter::new(0, 10);
        filter.status = Some(ResidencyStatus::Inactive);
        let listed = repo.list(&filter).await.unwrap();
        assert!(listed.iter().any(|r| r.id == inactive.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Residents::new(&mut conn);

        repo.create(&create_request("alice", "alice@example.com")).await.unwrap();
        repo.create(&create_request("bob", "bob@example.com")).await.unwrap();

        let mut filter = ResidentFilter::new(0, 10);
        filter.search = Some("ALI".to_string());
        let listed = repo.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "alice");
    }
}
