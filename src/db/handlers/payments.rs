//! Database repository for payments.

use crate::types::{PaymentId, ResidentId, abbrev_uuid};
use crate::{
    api::models::payments::PaymentState,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::payments::{FeeDBResponse, PaymentCreateDBRequest, PaymentDBResponse, PaymentUpdateDBRequest},
    },
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing payments
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub skip: i64,
    pub limit: i64,
    pub resident_id: Option<ResidentId>,
    pub state: Option<PaymentState>,
}

impl PaymentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            resident_id: None,
            state: None,
        }
    }
}

pub struct Payments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Payments<'c> {
    type CreateRequest = PaymentCreateDBRequest;
    type UpdateRequest = PaymentUpdateDBRequest;
    type Response = PaymentDBResponse;
    type Id = PaymentId;
    type Filter = PaymentFilter;

    #[instrument(skip(self, request), fields(resident_id = %abbrev_uuid(&request.resident_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let payment_id = Uuid::new_v4();

        let payment = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            INSERT INTO payments (id, resident_id, amount, description, transaction_reference, provider)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(request.resident_id)
        .bind(request.amount)
        .bind(&request.description)
        .bind(&request.transaction_reference)
        .bind(&request.provider)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let payments = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            SELECT * FROM payments
            WHERE ($1::uuid IS NULL OR resident_id = $1)
              AND ($2::payment_state IS NULL OR state = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.resident_id)
        .bind(filter.state)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(payments)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// State transitions keep `paid_at` consistent: moving to `paid` stamps it
    /// (first transition only), moving back to `pending` clears it.
    #[instrument(skip(self, request), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            UPDATE payments SET
                state = COALESCE($2, state),
                paid_at = CASE
                    WHEN $2 = 'paid'::payment_state AND state = 'pending'::payment_state THEN NOW()
                    WHEN $2 = 'pending'::payment_state THEN NULL
                    ELSE paid_at
                END,
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.state)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(payment)
    }
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_reference(&mut self, reference: &str) -> Result<Option<PaymentDBResponse>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE transaction_reference = $1")
            .bind(reference)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    /// Transition a payment to `paid` by its transaction reference.
    ///
    /// The state guard in the WHERE clause makes this safe under concurrent
    /// duplicate callbacks: exactly one caller observes a row, every other
    /// caller gets `None` and must check the current state to distinguish an
    /// unknown reference from an already-processed one.
    #[instrument(skip(self, provider_reference), err)]
    pub async fn mark_paid_by_reference(&mut self, reference: &str, provider_reference: Option<&str>) -> Result<Option<PaymentDBResponse>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            UPDATE payments SET
                state = 'paid',
                paid_at = NOW(),
                provider_reference = COALESCE($2, provider_reference)
            WHERE transaction_reference = $1 AND state = 'pending'
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(provider_reference)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(payment)
    }

    /// Outstanding (pending) payments joined with resident and apartment context.
    /// Passing a resident id scopes the result to that resident's dues.
    #[instrument(skip(self), err)]
    pub async fn list_fees(&mut self, resident_id: Option<ResidentId>, skip: i64, limit: i64) -> Result<Vec<FeeDBResponse>> {
        let fees = sqlx::query_as::<_, FeeDBResponse>(
            r#"
            SELECT p.id, p.resident_id,
                   COALESCE(r.display_name, r.username) AS resident_name,
                   r.apartment_id, a.number AS apartment_number,
                   p.amount, p.description, p.transaction_reference, p.created_at
            FROM payments p
            JOIN residents r ON r.id = p.resident_id
            LEFT JOIN apartments a ON a.id = r.apartment_id
            WHERE p.state = 'pending'
              AND ($1::uuid IS NULL OR p.resident_id = $1)
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(resident_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(fees)
    }

    /// Total count matching a filter, for pagination metadata
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &PaymentFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE ($1::uuid IS NULL OR resident_id = $1)
              AND ($2::payment_state IS NULL OR state = $2)
            "#,
        )
        .bind(filter.resident_id)
        .bind(filter.state)
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
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn seed_resident(conn: &mut PgConnection, username: &str) -> ResidentId {
        let mut repo = Residents::new(conn);
        let resident = repo
            .create(&ResidentCreateDBRequest::from(ResidentCreate {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                phone: "555-0100".to_string(),
                display_name: None,
                role: None,
                apartment_id: None,
            }))
            .await
            .unwrap();
        resident.id
    }

    fn create_request(resident_id: ResidentId, reference: &str) -> PaymentCreateDBRequest {
        PaymentCreateDBRequest {
            resident_id,
            amount: Decimal::new(12_050, 2), // 120.50
            description: Some("Monthly maintenance fee".to_string()),
            transaction_reference: reference.to_string(),
            provider: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_payment_starts_pending(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "payer").await;

        let mut repo = Payments::new(&mut conn);
        let payment = repo.create(&create_request(resident_id, "TXN-0001")).await.unwrap();

        assert_eq!(payment.state, PaymentState::Pending);
        assert!(payment.paid_at.is_none());
        assert_eq!(payment.amount, Decimal::new(12_050, 2));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_paid_by_reference_is_single_shot(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "payer").await;

        let mut repo = Payments::new(&mut conn);
        repo.create(&create_request(resident_id, "TXN-0002")).await.unwrap();

        // First callback wins
        let paid = repo.mark_paid_by_reference("TXN-0002", Some("prov-123")).await.unwrap().unwrap();
        assert_eq!(paid.state, PaymentState::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.provider_reference.as_deref(), Some("prov-123"));

        // Replay matches no pending row
        assert!(repo.mark_paid_by_reference("TXN-0002", Some("prov-456")).await.unwrap().is_none());

        // The stored payment is unchanged by the replay
        let stored = repo.get_by_reference("TXN-0002").await.unwrap().unwrap();
        assert_eq!(stored.provider_reference.as_deref(), Some("prov-123"));

        // Unknown references also return None
        assert!(repo.mark_paid_by_reference("TXN-MISSING", None).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_state_keeps_paid_at_consistent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "payer").await;

        let mut repo = Payments::new(&mut conn);
        let payment = repo.create(&create_request(resident_id, "TXN-0003")).await.unwrap();

        let paid = repo
            .update(
                payment.id,
                &PaymentUpdateDBRequest {
                    state: Some(PaymentState::Paid),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.state, PaymentState::Paid);
        assert!(paid.paid_at.is_some());

        let reverted = repo
            .update(
                payment.id,
                &PaymentUpdateDBRequest {
                    state: Some(PaymentState::Pending),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(reverted.state, PaymentState::Pending);
        assert!(reverted.paid_at.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_state_and_resident(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let first = seed_resident(&mut conn, "first").await;
        let second = seed_resident(&mut conn, "second").await;

        let mut repo = Payments::new(&mut conn);
        repo.create(&create_request(first, "TXN-A")).await.unwrap();
        repo.create(&create_request(second, "TXN-B")).await.unwrap();
        repo.mark_paid_by_reference("TXN-B", None).await.unwrap();

        let mut filter = PaymentFilter::new(0, 10);
        filter.state = Some(PaymentState::Pending);
        let pending = repo.list(&filter).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].transaction_reference, "TXN-A");

        let mut filter = PaymentFilter::new(0, 10);
        filter.resident_id = Some(second);
        let theirs = repo.list(&filter).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].transaction_reference, "TXN-B");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_fees_only_returns_pending(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "payer").await;

        let mut repo = Payments::new(&mut conn);
        repo.create(&create_request(resident_id, "TXN-OPEN")).await.unwrap();
        repo.create(&create_request(resident_id, "TXN-DONE")).await.unwrap();
        repo.mark_paid_by_reference("TXN-DONE", None).await.unwrap();

        let fees = repo.list_fees(Some(resident_id), 0, 10).await.unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].transaction_reference, "TXN-OPEN");
        assert_eq!(fees[0].resident_name, "payer");

        // Scoped to a different resident, nothing comes back
        assert!(repo.list_fees(Some(Uuid::new_v4()), 0, 10).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_reference_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resident_id = seed_resident(&mut conn, "payer").await;

        let mut repo = Payments::new(&mut conn);
        repo.create(&create_request(resident_id, "TXN-DUP")).await.unwrap();
        let err = repo.create(&create_request(resident_id, "TXN-DUP")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
