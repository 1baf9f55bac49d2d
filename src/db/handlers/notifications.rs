//! Database repository for notifications.

use crate::types::{ApartmentId, NotificationId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::notifications::{NotificationCreateDBRequest, NotificationDBResponse, NotificationUpdateDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing notifications
#[derive(Debug, Clone)]
pub struct NotificationFilter {
    pub skip: i64,
    pub limit: i64,
    /// When set, returns notifications for this apartment plus broadcasts
    pub apartment_id: Option<ApartmentId>,
    /// Restrict to broadcasts only (residents without an assigned apartment)
    pub only_broadcast: bool,
}

impl NotificationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            apartment_id: None,
            only_broadcast: false,
        }
    }
}

pub struct Notifications<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Notifications<'c> {
    type CreateRequest = NotificationCreateDBRequest;
    type UpdateRequest = NotificationUpdateDBRequest;
    type Response = NotificationDBResponse;
    type Id = NotificationId;
    type Filter = NotificationFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let notification_id = Uuid::new_v4();

        let notification = sqlx::query_as::<_, NotificationDBResponse>(
            r#"
            INSERT INTO notifications (id, apartment_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .bind(request.apartment_id)
        .bind(&request.content)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(notification)
    }

    #[instrument(skip(self), fields(notification_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(notification)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // Broadcasts (NULL apartment) are always included for apartment-scoped queries
        let notifications = sqlx::query_as::<_, NotificationDBResponse>(
            r#"
            SELECT * FROM notifications
            WHERE ($1::uuid IS NULL OR apartment_id = $1 OR apartment_id IS NULL)
              AND (NOT $2 OR apartment_id IS NULL)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.apartment_id)
        .bind(filter.only_broadcast)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(notifications)
    }

    #[instrument(skip(self), fields(notification_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Content edits are only allowed while the notification has not been sent.
    #[instrument(skip(self, request), fields(notification_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>(
            r#"
            UPDATE notifications SET
                content = COALESCE($2, content)
            WHERE id = $1 AND sent_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(notification)
    }
}

impl<'c> Notifications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Stamp `sent_at`, exactly once. Returns `None` when the notification is
    /// already sent (or does not exist); the caller disambiguates.
    #[instrument(skip(self), fields(notification_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_sent(&mut self, id: NotificationId) -> Result<Option<NotificationDBResponse>> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>(
            "UPDATE notifications SET sent_at = NOW() WHERE id = $1 AND sent_at IS NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(notification)
    }

    /// Total count matching a filter, for pagination metadata
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &NotificationFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE ($1::uuid IS NULL OR apartment_id = $1 OR apartment_id IS NULL)
              AND (NOT $2 OR apartment_id IS NULL)
            "#,
        )
        .bind(filter.apartment_id)
        .bind(filter.only_broadcast)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::db::handlers::Apartments;
    use crate::db::models::apartments::ApartmentCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_apartment(conn: &mut PgConnection, number: &str) -> ApartmentId {
        let mut repo = Apartments::new(conn);
        repo.create(&ApartmentCreateDBRequest {
            number: number.to_string(),
            floor: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_notification_unsent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Notifications::new(&mut conn);

        let notification = repo
            .create(&NotificationCreateDBRequest {
                apartment_id: None,
                content: "Water outage on Tuesday".to_string(),
            })
            .await
            .unwrap();

        assert!(notification.sent_at.is_none());
        assert!(notification.apartment_id.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_sent_is_single_shot(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Notifications::new(&mut conn);

        let notification = repo
            .create(&NotificationCreateDBRequest {
                apartment_id: None,
                content: "Elevator maintenance".to_string(),
            })
            .await
            .unwrap();

        let sent = repo.mark_sent(notification.id).await.unwrap().unwrap();
        assert!(sent.sent_at.is_some());

        // Second dispatch is rejected
        assert!(repo.mark_sent(notification.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_rejected_after_send(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Notifications::new(&mut conn);

        let notification = repo
            .create(&NotificationCreateDBRequest {
                apartment_id: None,
                content: "Draft".to_string(),
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                notification.id,
                &NotificationUpdateDBRequest {
                    content: Some("Final".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "Final");

        repo.mark_sent(notification.id).await.unwrap();

        let err = repo
            .update(
                notification.id,
                &NotificationUpdateDBRequest {
                    content: Some("Too late".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_apartment_scoped_list_includes_broadcasts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let apartment = seed_apartment(&mut conn, "5A").await;
        let other = seed_apartment(&mut conn, "5B").await;

        let mut repo = Notifications::new(&mut conn);
        repo.create(&NotificationCreateDBRequest {
            apartment_id: Some(apartment),
            content: "Yours".to_string(),
        })
        .await
        .unwrap();
        repo.create(&NotificationCreateDBRequest {
            apartment_id: Some(other),
            content: "Not yours".to_string(),
        })
        .await
        .unwrap();
        repo.create(&NotificationCreateDBRequest {
            apartment_id: None,
            content: "Everyone".to_string(),
        })
        .await
        .unwrap();

        let mut filter = NotificationFilter::new(0, 10);
        filter.apartment_id = Some(apartment);
        let listed = repo.list(&filter).await.unwrap();

        let contents: Vec<_> = listed.iter().map(|n| n.content.as_str()).collect();
        assert!(contents.contains(&"Yours"));
        assert!(contents.contains(&"Everyone"));
        assert!(!contents.contains(&"Not yours"));
    }
}
