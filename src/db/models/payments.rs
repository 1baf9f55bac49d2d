//! Database models for payments.

use crate::api::models::payments::PaymentState;
use crate::types::{ApartmentId, PaymentId, ResidentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for creating a new payment
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub resident_id: ResidentId,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Server-generated reference handed to the payment provider
    pub transaction_reference: String,
    pub provider: Option<String>,
}

/// Database request for updating a payment's state
#[derive(Debug, Clone)]
pub struct PaymentUpdateDBRequest {
    pub state: Option<PaymentState>,
    pub description: Option<String>,
}

/// Database response for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub resident_id: ResidentId,
    pub amount: Decimal,
    pub description: Option<String>,
    pub state: PaymentState,
    pub transaction_reference: String,
    pub provider: Option<String>,
    pub provider_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A pending payment joined with resident and apartment context, as returned
/// by the outstanding-fees query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeeDBResponse {
    pub id: PaymentId,
    pub resident_id: ResidentId,
    pub resident_name: String,
    pub apartment_id: Option<ApartmentId>,
    pub apartment_number: Option<String>,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_reference: String,
    pub created_at: DateTime<Utc>,
}
