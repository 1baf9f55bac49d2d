//! Database models for residents.

use crate::api::models::residents::{ResidencyStatus, ResidentCreate, ResidentRole};
use crate::types::{ApartmentId, ResidentId};
use chrono::{DateTime, Utc};

/// Database request for creating a new resident
#[derive(Debug, Clone)]
pub struct ResidentCreateDBRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub display_name: Option<String>,
    pub role: ResidentRole,
    pub apartment_id: Option<ApartmentId>,
    pub password_hash: Option<String>,
}

impl From<ResidentCreate> for ResidentCreateDBRequest {
    fn from(api: ResidentCreate) -> Self {
        Self {
            username: api.username,
            email: api.email,
            phone: api.phone,
            display_name: api.display_name,
            role: api.role.unwrap_or(ResidentRole::Resident),
            apartment_id: api.apartment_id,
            password_hash: None, // Set separately after hashing
        }
    }
}

/// Database request for updating a resident.
///
/// `None` fields are left untouched (COALESCE in the update statement).
#[derive(Debug, Clone, Default)]
pub struct ResidentUpdateDBRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<ResidentRole>,
    pub status: Option<ResidencyStatus>,
    pub apartment_id: Option<ApartmentId>,
    pub password_hash: Option<String>,
}

/// Database response for a resident
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResidentDBResponse {
    pub id: ResidentId,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub display_name: Option<String>,
    pub role: ResidentRole,
    pub status: ResidencyStatus,
    pub apartment_id: Option<ApartmentId>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
