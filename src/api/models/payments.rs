//! API request/response models for payments and fees.

use super::pagination::Pagination;
use crate::db::models::payments::{FeeDBResponse, PaymentDBResponse};
use crate::types::{ApartmentId, PaymentId, ResidentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Payment lifecycle state.
///
/// Serialized as `"pending"` / `"paid"`. Deserialization additionally accepts
/// the numeric `0` / `1` encoding used by the legacy client.
#[derive(Debug, Clone, Copy, Serialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Paid,
}

impl<'de> Deserialize<'de> for PaymentState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(0) => Ok(PaymentState::Pending),
            Repr::Number(1) => Ok(PaymentState::Paid),
            Repr::Number(n) => Err(serde::de::Error::custom(format!("invalid payment state: {n} (expected 0 or 1)"))),
            Repr::Text(s) => match s.as_str() {
                "pending" => Ok(PaymentState::Pending),
                "paid" => Ok(PaymentState::Paid),
                other => Err(serde::de::Error::custom(format!(
                    "invalid payment state: {other:?} (expected \"pending\" or \"paid\")"
                ))),
            },
        }
    }
}

// Payment request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreate {
    #[schema(value_type = String, format = "uuid")]
    pub resident_id: ResidentId,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub description: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentUpdate {
    pub state: Option<PaymentState>,
    pub description: Option<String>,
}

// Payment response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub resident_id: ResidentId,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub description: Option<String>,
    pub state: PaymentState,
    pub transaction_reference: String,
    pub provider: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            resident_id: db.resident_id,
            amount: db.amount,
            description: db.description,
            state: db.state,
            transaction_reference: db.transaction_reference,
            provider: db.provider,
            paid_at: db.paid_at,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListPaymentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by resident
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub resident_id: Option<ResidentId>,

    /// Filter by payment state
    pub state: Option<PaymentState>,
}

/// An outstanding fee: a pending payment with resident and apartment context.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub resident_id: ResidentId,
    pub resident_name: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub apartment_id: Option<ApartmentId>,
    pub apartment_number: Option<String>,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<FeeDBResponse> for FeeResponse {
    fn from(db: FeeDBResponse) -> Self {
        Self {
            id: db.id,
            resident_id: db.resident_id,
            resident_name: db.resident_name,
            apartment_id: db.apartment_id,
            apartment_number: db.apartment_number,
            amount: db.amount,
            description: db.description,
            transaction_reference: db.transaction_reference,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for the public payment-status lookup
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PaymentStatusQuery {
    /// Transaction reference handed out at payment creation
    pub reference: String,
}

/// Public-shape payment status, safe to show on the payment return page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusResponse {
    pub transaction_reference: String,
    pub state: PaymentState,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<PaymentDBResponse> for PaymentStatusResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            transaction_reference: db.transaction_reference,
            state: db.state,
            amount: db.amount,
            paid_at: db.paid_at,
        }
    }
}

/// Body posted by the payment provider to `/payments/callback`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCallbackRequest {
    pub transaction_reference: String,
    /// Provider status string; only `"success"` transitions the payment
    pub status: String,
    pub provider: Option<String>,
    pub provider_reference: Option<String>,
}

/// Acknowledgement returned to the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCallbackResponse {
    pub message: String,
}
